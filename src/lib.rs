//! The library code for the `issueblog` static site generator, which
//! publishes a repository's GitHub issues as a blog. The architecture can be
//! generally broken down into three steps:
//!
//! 1. Fetching the owner's open issues ([`crate::github`])
//! 2. Converting the issues into posts ([`crate::post`]) and indexing them by
//!    label ([`crate::category`])
//! 3. Converting the posts into output files on disk ([`crate::write`])
//!
//! The third step is the more involved. Every page type (paginated indices,
//! posts, category pages, archives, search) is a theme template filled in by
//! [`crate::template`], with repeated structures such as post cards rendered
//! up front by [`crate::fragment`]. Before a page hits the disk,
//! [`crate::paths`] rewrites its root-relative links so that sites deployed
//! under a sub-path (e.g. a GitHub project page) resolve correctly.
//!
//! [`crate::build`] stitches the steps together; [`crate::serve`] and
//! [`crate::check`] support previewing and deploying the result.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod archive;
pub mod build;
pub mod category;
pub mod check;
pub mod comments;
pub mod config;
pub mod feed;
pub mod fragment;
pub mod github;
pub mod markdown;
pub mod paths;
pub mod post;
pub mod proxy;
pub mod search;
pub mod serve;
pub mod sitemap;
pub mod template;
pub mod write;
