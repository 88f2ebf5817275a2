//! Loan and reservation transaction endpoints
//!
//! Each call is one atomic server-side operation that creates the record and
//! updates the book status together.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{LoanId, LoanTransaction, ReservationId, ReservationTransaction},
};

use super::{rejection, ApiClient, CREATE_LOAN, CREATE_RESERVATION};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionApi: Send + Sync {
    async fn create_loan(&self, transaction: &LoanTransaction) -> AppResult<LoanId>;
    async fn create_reservation(
        &self,
        transaction: &ReservationTransaction,
    ) -> AppResult<ReservationId>;
}

/// Transaction endpoints over HTTP
#[derive(Clone)]
pub struct HttpTransactionApi {
    client: ApiClient,
}

impl HttpTransactionApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// POST the body once and pull `key` out of the answer
    async fn submit<B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
        key: &str,
    ) -> AppResult<String> {
        let response = self
            .client
            .authorized_request(Method::POST, segments)?
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Network(format!("Unexpected transaction response: {}", e)))?;

        created_name(&body, key).ok_or_else(|| {
            AppError::Transaction(format!("Server did not return a {}", key.replace('_', " ")))
        })
    }
}

/// The name is either top-level or wrapped in `message` by whitelisted methods
fn created_name(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .or_else(|| body.get("message").and_then(|m| m.get(key)))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(String::from)
}

#[async_trait]
impl TransactionApi for HttpTransactionApi {
    async fn create_loan(&self, transaction: &LoanTransaction) -> AppResult<LoanId> {
        self.submit(CREATE_LOAN, transaction, "loan_name")
            .await
            .map(LoanId)
    }

    async fn create_reservation(
        &self,
        transaction: &ReservationTransaction,
    ) -> AppResult<ReservationId> {
        self.submit(CREATE_RESERVATION, transaction, "reservation_name")
            .await
            .map(ReservationId)
    }
}
