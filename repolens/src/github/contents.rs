//! GitHub contents API client: single files and recursive directory listings.

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::Value;

use super::{RepoRef, TreeNode};
use crate::auth::Credential;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::relay::FileSource;

/// One entry of a contents API directory response.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    #[serde(rename = "type")]
    kind: String,
    path: String,
    url: Option<String>,
}

/// A directory level that could not be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryFailure {
    /// Repository path of the directory (empty for the root).
    pub path: String,
    pub depth: usize,
    pub status: u16,
    pub body: String,
}

impl std::fmt::Display for DirectoryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(
            f,
            "Failed to fetch contents of {path}: {} - {}",
            self.status, self.body
        )
    }
}

/// Result of a recursive directory walk.
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    pub entries: Vec<TreeNode>,
    /// Root status when the root failed, else the deepest failure's status,
    /// else the root's success status.
    pub status: u16,
    pub failures: Vec<DirectoryFailure>,
    /// Set when the depth or node ceiling stopped the walk early.
    pub truncated: bool,
}

impl DirectoryListing {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.truncated
    }

    /// Whether the repository root itself could not be listed.
    pub fn root_failed(&self) -> bool {
        self.failures.iter().any(|f| f.depth == 0)
    }
}

/// A listing slot; directories point at the listing holding their children.
enum Slot {
    Node(TreeNode),
    Dir { path: String, listing: usize },
}

struct PendingDir {
    url: String,
    path: String,
    listing: usize,
    depth: usize,
}

/// Authenticated client for `GET /repos/{owner}/{repo}/contents/{path}`.
#[derive(Clone)]
pub struct ContentsClient {
    http: reqwest::Client,
    api_base: String,
    max_depth: usize,
    max_nodes: usize,
}

impl ContentsClient {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            api_base: config.github_api_url.trim_end_matches('/').to_string(),
            max_depth: config.max_depth,
            max_nodes: config.max_nodes,
        }
    }

    fn get(&self, url: &str, credential: &Credential) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header(AUTHORIZATION, credential.authorization_header())
            .header(ACCEPT, "application/vnd.github+json")
    }

    /// Contents API URL for a file path inside `repo`.
    pub fn file_url(&self, repo: &RepoRef, path: &str) -> String {
        let encoded: Vec<_> = path
            .trim_start_matches('/')
            .split('/')
            .map(urlencoding::encode)
            .collect();
        format!("{}{}", repo.contents_url(&self.api_base), encoded.join("/"))
    }

    /// Fetch and decode a single file.
    pub async fn fetch_file(
        &self,
        path: &str,
        repo: &RepoRef,
        credential: &Credential,
    ) -> Result<String> {
        let url = self.file_url(repo, path);
        tracing::debug!(%repo, path, "fetching file");

        let resp = self.get(&url, credential).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(%repo, path, status = status.as_u16(), "file fetch failed");
            return Err(AppError::Fetch {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = resp.json().await?;
        if payload.is_array() {
            return Err(AppError::Decode(format!("{path} is a directory")));
        }
        let content = payload.get("content").and_then(Value::as_str).unwrap_or("");
        decode_content(content)
    }

    /// List the repository root recursively.
    pub async fn fetch_repository(
        &self,
        repo: &RepoRef,
        credential: &Credential,
    ) -> Result<DirectoryListing> {
        self.fetch_directory(&repo.contents_url(&self.api_base), credential)
            .await
    }

    /// Walk the directory at `url` and every directory beneath it.
    ///
    /// Failed levels are left empty and recorded in
    /// [`DirectoryListing::failures`]; transport errors abort the walk.
    pub async fn fetch_directory(
        &self,
        url: &str,
        credential: &Credential,
    ) -> Result<DirectoryListing> {
        let mut listings: Vec<Vec<Slot>> = vec![Vec::new()];
        let mut pending = vec![PendingDir {
            url: url.to_string(),
            path: String::new(),
            listing: 0,
            depth: 0,
        }];
        let mut root_status = None;
        let mut failures = Vec::new();
        let mut truncated = false;
        let mut listed = 0usize;

        while let Some(dir) = pending.pop() {
            tracing::debug!(url = %dir.url, depth = dir.depth, "listing directory");
            let resp = self.get(&dir.url, credential).send().await?;
            let status = resp.status().as_u16();
            if dir.depth == 0 {
                root_status = Some(status);
            }

            if !resp.status().is_success() {
                let body = resp.text().await.unwrap_or_default();
                tracing::warn!(path = %dir.path, status, "directory listing failed");
                failures.push(DirectoryFailure {
                    path: dir.path,
                    depth: dir.depth,
                    status,
                    body,
                });
                continue;
            }

            let items = match resp.json::<Value>().await? {
                Value::Array(items) => items,
                other => vec![other],
            };

            let mut children = Vec::new();
            for item in items {
                listed += 1;
                let Ok(entry) = serde_json::from_value::<ContentEntry>(item) else {
                    listings[dir.listing].push(Slot::Node(TreeNode::Malformed));
                    continue;
                };
                if entry.kind != "dir" {
                    listings[dir.listing].push(Slot::Node(TreeNode::File { path: entry.path }));
                    continue;
                }

                let within_limits = dir.depth < self.max_depth && listed <= self.max_nodes;
                match entry.url {
                    Some(child_url) if within_limits => {
                        let listing = listings.len();
                        listings.push(Vec::new());
                        children.push(PendingDir {
                            url: child_url,
                            path: entry.path.clone(),
                            listing,
                            depth: dir.depth + 1,
                        });
                        listings[dir.listing].push(Slot::Dir {
                            path: entry.path,
                            listing,
                        });
                    }
                    Some(_) => {
                        truncated = true;
                        listings[dir.listing].push(Slot::Node(TreeNode::directory(
                            entry.path,
                            Vec::new(),
                        )));
                    }
                    None => {
                        tracing::warn!(path = %entry.path, "directory entry has no url");
                        listings[dir.listing].push(Slot::Node(TreeNode::directory(
                            entry.path,
                            Vec::new(),
                        )));
                    }
                }
            }
            // Reverse so the stack visits siblings in listing order.
            pending.extend(children.into_iter().rev());
        }

        if truncated {
            tracing::warn!(listed, "directory walk truncated");
        }

        let root_status = root_status.unwrap_or_default();
        let status = failures
            .iter()
            .find(|f| f.depth == 0)
            .or_else(|| failures.iter().rev().max_by_key(|f| f.depth))
            .map_or(root_status, |f| f.status);

        Ok(DirectoryListing {
            entries: assemble(&mut listings, 0),
            status,
            failures,
            truncated,
        })
    }
}

fn assemble(listings: &mut Vec<Vec<Slot>>, index: usize) -> Vec<TreeNode> {
    std::mem::take(&mut listings[index])
        .into_iter()
        .map(|slot| match slot {
            Slot::Node(node) => node,
            Slot::Dir { path, listing } => TreeNode::Directory {
                path,
                children: assemble(listings, listing),
            },
        })
        .collect()
}

/// Decode GitHub's base64 payload, which is wrapped with newlines.
fn decode_content(content: &str) -> Result<String> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| AppError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Decode(e.to_string()))
}

#[async_trait]
impl FileSource for ContentsClient {
    async fn fetch_file(&self, path: &str, repo: &RepoRef, credential: &Credential) -> Result<String> {
        Self::fetch_file(self, path, repo, credential).await
    }
}
