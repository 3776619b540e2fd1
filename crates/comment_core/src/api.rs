use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{AnswerId, CommentId, ParentRef},
    protocol::{
        Comment, CommentDraft, CommentList, CreateCommentRequest, Envelope, ListCommentsQuery,
        PageRequest,
    },
};
use url::Url;

use crate::error::CommentError;

#[async_trait]
pub trait CommentApi: Send + Sync {
    async fn create_comment(
        &self,
        answer_id: &AnswerId,
        draft: &CommentDraft,
    ) -> Result<Comment, CommentError>;
    async fn delete_comment(&self, comment_id: &CommentId) -> Result<(), CommentError>;
    async fn list_comments(
        &self,
        parent: &ParentRef,
        request: PageRequest,
    ) -> Result<Vec<Comment>, CommentError>;
}

pub struct HttpCommentApi {
    http: Client,
    base_url: Url,
}

impl HttpCommentApi {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid comments api url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("comments api url '{base_url}' cannot carry a path"));
        }
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn list_endpoint(&self, parent: &ParentRef) -> Url {
        match parent {
            ParentRef::Answer(answer_id) => {
                self.endpoint(&["comments", "byAnswer", answer_id.as_str()])
            }
            ParentRef::Question(question_id) => {
                self.endpoint(&["comments", "byQuestion", question_id.as_str()])
            }
        }
    }
}

async fn read_body(response: Response) -> Result<(reqwest::StatusCode, Vec<u8>), CommentError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(CommentError::from_response(status, &body));
    }
    Ok((status, body.to_vec()))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, CommentError> {
    let (status, body) = read_body(response).await?;
    serde_json::from_slice::<Envelope<T>>(&body)
        .map(Envelope::into_inner)
        .map_err(|err| CommentError::malformed_body(status, &err))
}

#[async_trait]
impl CommentApi for HttpCommentApi {
    async fn create_comment(
        &self,
        answer_id: &AnswerId,
        draft: &CommentDraft,
    ) -> Result<Comment, CommentError> {
        let response = self
            .http
            .post(self.endpoint(&["comments", "create"]))
            .json(&CreateCommentRequest { draft, answer_id })
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete_comment(&self, comment_id: &CommentId) -> Result<(), CommentError> {
        let response = self
            .http
            .delete(self.endpoint(&["comments", "delete", comment_id.as_str()]))
            .send()
            .await?;
        read_body(response).await?;
        Ok(())
    }

    async fn list_comments(
        &self,
        parent: &ParentRef,
        request: PageRequest,
    ) -> Result<Vec<Comment>, CommentError> {
        let response = self
            .http
            .get(self.list_endpoint(parent))
            .query(&ListCommentsQuery::from(request))
            .send()
            .await?;
        let list: CommentList = read_json(response).await?;
        Ok(list.into_comments())
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
