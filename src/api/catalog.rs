//! Catalog resource endpoints (books and members)

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookInput, Member, MemberInput},
};

use super::{rejection, ApiClient, BOOK_RESOURCE, MEMBER_RESOURCE};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_books(&self) -> AppResult<Vec<Book>>;
    async fn get_book(&self, id: &str) -> AppResult<Book>;
    async fn create_book(&self, input: &BookInput) -> AppResult<Book>;
    async fn update_book(&self, id: &str, input: &BookInput) -> AppResult<Book>;
    async fn delete_book(&self, id: &str) -> AppResult<()>;
    async fn list_members(&self) -> AppResult<Vec<Member>>;
    async fn create_member(&self, input: &MemberInput) -> AppResult<Member>;
    async fn update_member(&self, id: &str, input: &MemberInput) -> AppResult<Member>;
    async fn delete_member(&self, id: &str) -> AppResult<()>;
}

/// `{ "data": ... }` wrapper used by every resource endpoint
#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Catalog over HTTP
#[derive(Clone)]
pub struct HttpCatalogApi {
    client: ApiClient,
}

impl HttpCatalogApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    async fn list<T: DeserializeOwned>(&self, doctype: &str, fields: &[&str]) -> AppResult<Vec<T>> {
        let fields = serde_json::to_string(fields)
            .map_err(|e| AppError::Internal(format!("Failed to encode field list: {}", e)))?;
        let response = self
            .client
            .authorized_request(Method::GET, &["resource", doctype])?
            .query(&[("fields", fields.as_str()), ("limit_page_length", "0")])
            .send()
            .await?;
        read_data(response).await
    }

    async fn write<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> AppResult<T> {
        let response = self
            .client
            .authorized_request(method, segments)?
            .json(body)
            .send()
            .await?;
        read_data(response).await
    }

    async fn remove(&self, doctype: &str, id: &str) -> AppResult<()> {
        let response = self
            .client
            .authorized_request(Method::DELETE, &["resource", doctype, id])?
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejection(response).await)
        }
    }
}

async fn read_data<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    if !response.status().is_success() {
        return Err(rejection(response).await);
    }
    let envelope: DataEnvelope<T> = response
        .json()
        .await
        .map_err(|e| AppError::Network(format!("Unexpected catalog response: {}", e)))?;
    Ok(envelope.data)
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.list(BOOK_RESOURCE, Book::FIELDS).await
    }

    async fn get_book(&self, id: &str) -> AppResult<Book> {
        let response = self
            .client
            .authorized_request(Method::GET, &["resource", BOOK_RESOURCE, id])?
            .send()
            .await?;
        read_data(response).await
    }

    async fn create_book(&self, input: &BookInput) -> AppResult<Book> {
        self.write(Method::POST, &["resource", BOOK_RESOURCE], input).await
    }

    async fn update_book(&self, id: &str, input: &BookInput) -> AppResult<Book> {
        self.write(Method::PUT, &["resource", BOOK_RESOURCE, id], input).await
    }

    async fn delete_book(&self, id: &str) -> AppResult<()> {
        self.remove(BOOK_RESOURCE, id).await
    }

    async fn list_members(&self) -> AppResult<Vec<Member>> {
        self.list(MEMBER_RESOURCE, Member::FIELDS).await
    }

    async fn create_member(&self, input: &MemberInput) -> AppResult<Member> {
        self.write(Method::POST, &["resource", MEMBER_RESOURCE], input).await
    }

    async fn update_member(&self, id: &str, input: &MemberInput) -> AppResult<Member> {
        self.write(Method::PUT, &["resource", MEMBER_RESOURCE, id], input).await
    }

    async fn delete_member(&self, id: &str) -> AppResult<()> {
        self.remove(MEMBER_RESOURCE, id).await
    }
}
