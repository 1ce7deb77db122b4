//! Fetches the blog's source records: open issues authored by the repository
//! owner, plus each issue's comments.

use crate::config::GithubConfig;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;

/// An issue as returned by the GitHub REST API. Only the fields the site
/// needs are deserialized.
#[derive(Deserialize, Clone, Debug)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub html_url: String,
    pub user: User,
    #[serde(default)]
    pub labels: Vec<Label>,

    /// The number of comments on the issue.
    #[serde(default)]
    pub comments: u64,

    /// Present only when the "issue" is really a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,

    /// Filled in by [`Client::fetch_issues`].
    #[serde(skip)]
    pub issue_comments: Vec<Comment>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    /// A six-digit hex color without the leading `#`.
    #[serde(default)]
    pub color: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Comment {
    pub user: User,
    #[serde(default)]
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A thin client for the two issue endpoints the build uses.
pub struct Client {
    http: reqwest::Client,
    api_url: String,
    owner: String,
    repo: String,
}

impl Client {
    /// Creates a client for the repository in `config`. The token, when
    /// present, is sent as a bearer token.
    pub fn new(config: &GithubConfig, token: Option<&str>) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Client {
            http,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
        })
    }

    /// Lists the open issues created by the owner, newest first, capped at
    /// one page of 100. Pull requests are dropped. Comments are fetched one
    /// issue at a time, and only for issues that have any.
    pub async fn fetch_issues(&self) -> Result<Vec<Issue>> {
        let url = format!("{}/repos/{}/{}/issues", self.api_url, self.owner, self.repo);
        let issues: Vec<Issue> = self
            .http
            .get(&url)
            .query(&[
                ("state", "open"),
                ("creator", self.owner.as_str()),
                ("sort", "created"),
                ("direction", "desc"),
                ("per_page", "100"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut issues: Vec<Issue> = issues
            .into_iter()
            .filter(|issue| issue.pull_request.is_none())
            .collect();
        tracing::info!(count = issues.len(), "found open issues");

        for issue in issues.iter_mut() {
            if issue.comments > 0 {
                issue.issue_comments = self.fetch_comments(issue.number).await?;
            }
        }
        Ok(issues)
    }

    async fn fetch_comments(&self, number: u64) -> Result<Vec<Comment>> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, self.owner, self.repo, number
        );
        tracing::debug!(issue = number, "fetching comments");
        Ok(self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

/// Where the build's issues came from.
#[derive(Debug)]
pub enum Fetched {
    /// The issues were fetched from the API.
    Live(Vec<Issue>),

    /// The API call failed and the sample issues were substituted.
    Fallback { issues: Vec<Issue>, reason: String },
}

impl Fetched {
    pub fn issues(&self) -> &[Issue] {
        match self {
            Fetched::Live(issues) => issues,
            Fetched::Fallback { issues, .. } => issues,
        }
    }

    pub fn into_issues(self) -> Vec<Issue> {
        match self {
            Fetched::Live(issues) => issues,
            Fetched::Fallback { issues, .. } => issues,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Fetched::Live(_))
    }
}

/// Fetches the issues, substituting [`sample_issues`] on any failure. There
/// are no retries.
pub async fn fetch(client: &Client) -> Fetched {
    match client.fetch_issues().await {
        Ok(issues) => Fetched::Live(issues),
        Err(e) => {
            tracing::warn!(%e, "failed to fetch issues, using sample posts");
            Fetched::Fallback {
                issues: sample_issues(&client.owner, &client.repo),
                reason: e.to_string(),
            }
        }
    }
}

/// Two fixed sample issues that let the rest of the pipeline run without
/// API access. Issue #2 is the newer one.
pub fn sample_issues(owner: &str, repo: &str) -> Vec<Issue> {
    let now = Utc::now();
    let yesterday = now - Duration::days(1);
    let user = User {
        login: owner.to_owned(),
        avatar_url: format!("https://github.com/{}.png", owner),
    };
    let label = |name: &str, color: &str| Label {
        name: name.to_owned(),
        color: color.to_owned(),
    };

    vec![
        Issue {
            number: 2,
            title: String::from("如何使用这个博客系统"),
            body: Some(String::from(
                "# 如何使用这个博客系统\n\n## 创建文章\n\n1. 在 GitHub 仓库中创建新的 Issue\n2. 使用 Markdown 格式写作\n3. 添加标签作为分类\n4. 发布后会自动生成博客文章\n\n## 管理评论\n\nIssue 的评论会自动显示为文章评论。",
            )),
            created_at: now,
            updated_at: now,
            html_url: format!("https://github.com/{}/{}/issues/2", owner, repo),
            user: user.clone(),
            labels: vec![label("教程", "a2eeef"), label("使用指南", "d73a4a")],
            comments: 1,
            pull_request: None,
            issue_comments: vec![Comment {
                user: user.clone(),
                body: Some(String::from("这是一个示例评论。")),
                created_at: now,
            }],
        },
        Issue {
            number: 1,
            title: String::from("欢迎来到 Issue Blog"),
            body: Some(String::from(
                "# 欢迎来到 Issue Blog\n\n这是一个基于 GitHub Issues 的博客系统。\n\n## 特性\n\n- 使用 GitHub Issues 作为博客文章\n- 自动部署到 GitHub Pages\n- 支持标签分类\n- 响应式设计\n\n开始写作吧！",
            )),
            created_at: yesterday,
            updated_at: yesterday,
            html_url: format!("https://github.com/{}/{}/issues/1", owner, repo),
            user,
            labels: vec![label("博客", "0075ca"), label("介绍", "7057ff")],
            comments: 0,
            pull_request: None,
            issue_comments: Vec::new(),
        },
    ]
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed API call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for network errors, non-success statuses, and bodies that
    /// don't deserialize.
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Returned when the token can't be used as a header value.
    #[error("invalid API token: {0}")]
    InvalidToken(#[from] header::InvalidHeaderValue),
}

#[cfg(test)]
mod test {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> GithubConfig {
        GithubConfig {
            owner: String::from("octocat"),
            repo: String::from("notes"),
            api_url: server.uri(),
        }
    }

    fn issue_json(number: u64, comments: u64) -> serde_json::Value {
        serde_json::json!({
            "number": number,
            "title": format!("Issue {}", number),
            "body": "hello",
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z",
            "html_url": format!("https://github.com/octocat/notes/issues/{}", number),
            "user": { "login": "octocat", "avatar_url": "https://a/octocat.png" },
            "labels": [{ "name": "rust", "color": "dea584" }],
            "comments": comments,
        })
    }

    #[tokio::test]
    async fn test_fetch_issues() -> Result<()> {
        let server = MockServer::start().await;
        let mut pr = issue_json(3, 0);
        pr["pull_request"] = serde_json::json!({ "url": "x" });
        Mock::given(method("GET"))
            .and(path("/repos/octocat/notes/issues"))
            .and(query_param("state", "open"))
            .and(query_param("creator", "octocat"))
            .and(query_param("per_page", "100"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                issue_json(2, 1),
                pr,
                issue_json(1, 0),
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/notes/issues/2/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "user": { "login": "reader", "avatar_url": "" },
                "body": "nice",
                "created_at": "2024-03-02T10:00:00Z",
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(&config(&server), Some("secret"))?;
        let issues = client.fetch_issues().await?;
        assert_eq!(vec![2, 1], issues.iter().map(|i| i.number).collect::<Vec<_>>());
        assert_eq!(1, issues[0].issue_comments.len());
        assert_eq!("reader", issues[0].issue_comments[0].user.login);
        assert!(issues[1].issue_comments.is_empty());
        assert_eq!("dea584", issues[0].labels[0].color);
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_falls_back_on_error_status() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetched = fetch(&Client::new(&config(&server), None)?).await;
        assert!(!fetched.is_live());
        match &fetched {
            Fetched::Fallback { reason, .. } => assert!(reason.contains("500"), "{}", reason),
            Fetched::Live(_) => unreachable!(),
        }
        let numbers: Vec<u64> = fetched.issues().iter().map(|i| i.number).collect();
        assert_eq!(vec![2, 1], numbers);
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_falls_back_on_malformed_body() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let fetched = fetch(&Client::new(&config(&server), None)?).await;
        assert!(!fetched.is_live());
        assert_eq!(2, fetched.into_issues().len());
        Ok(())
    }

    #[test]
    fn test_sample_issues() {
        let issues = sample_issues("octocat", "notes");
        assert_eq!(2, issues.len());
        assert!(issues[0].created_at > issues[1].created_at);
        assert_eq!(1, issues[0].issue_comments.len());
        assert_eq!("https://github.com/octocat/notes/issues/1", issues[1].html_url);
    }
}
