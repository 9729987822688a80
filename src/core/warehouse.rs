//! Warehouse replenishment requests
//!
//! Drafts are validated locally before submission. Approval stages are
//! decided by the backend; the client only asks for a transition and shows
//! the resulting status.

use std::collections::HashSet;

use log::info;
use serde::Serialize;

use super::http::ApiClient;
use super::resource::{Entity, Resource};
use crate::error::{PolyclinicError, Result};
use crate::types::{Id, RequestLine, WarehouseRequest};

/// A request being filled in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestDraft {
    pub department_id: Option<Id>,
    pub destination_id: Option<Id>,
    pub lines: Vec<RequestLine>,
}

impl RequestDraft {
    pub fn for_department(department_id: Id) -> Self {
        Self {
            department_id: Some(department_id),
            ..Default::default()
        }
    }

    pub fn add_line(&mut self, medication_id: Id, quantity: i64) {
        self.lines.push(RequestLine {
            medication_id,
            quantity,
        });
    }

    /// Client-side checks, run before anything is sent
    pub fn validate(&self) -> Result<()> {
        if self.department_id.is_none() {
            return Err(PolyclinicError::validation("Select the requesting department"));
        }
        if self.lines.is_empty() {
            return Err(PolyclinicError::validation("Add at least one medication"));
        }
        if let Some(line) = self.lines.iter().find(|l| l.quantity <= 0) {
            return Err(PolyclinicError::validation(format!(
                "Invalid quantity {} for medication #{}",
                line.quantity, line.medication_id
            )));
        }

        let mut seen = HashSet::new();
        if let Some(line) = self.lines.iter().find(|l| !seen.insert(l.medication_id)) {
            return Err(PolyclinicError::validation(format!(
                "Medication #{} is listed twice",
                line.medication_id
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewRequest<'a> {
    department_id: Id,
    destination_id: Option<Id>,
    lines: &'a [RequestLine],
}

#[derive(Debug, Serialize)]
struct Rejection<'a> {
    reason: &'a str,
}

/// Requests not yet delivered or rejected that involve `department`, either
/// as requester or as destination
pub fn pending_for(requests: Vec<WarehouseRequest>, department: Id) -> Vec<WarehouseRequest> {
    requests
        .into_iter()
        .filter(|r| !r.status.is_final())
        .filter(|r| r.department_id == department || r.destination_id == Some(department))
        .collect()
}

#[derive(Clone)]
pub struct Warehouse {
    requests: Resource<WarehouseRequest>,
}

impl Warehouse {
    pub fn new(client: ApiClient) -> Self {
        Self {
            requests: Resource::new(client),
        }
    }

    pub fn requests(&self) -> &Resource<WarehouseRequest> {
        &self.requests
    }

    pub async fn submit(&self, draft: &RequestDraft) -> Result<WarehouseRequest> {
        draft.validate()?;
        let department_id = draft.department_id.ok_or(PolyclinicError::NoSelection)?;

        let created = self
            .requests
            .create(&NewRequest {
                department_id,
                destination_id: draft.destination_id,
                lines: &draft.lines,
            })
            .await?;
        info!("submitted warehouse request #{}", created.id);
        Ok(created)
    }

    /// Ask the backend to advance the request to its next approval stage
    pub async fn approve(&self, id: Id) -> Result<WarehouseRequest> {
        let path = format!("{}/{}/approve", WarehouseRequest::PATH, id);
        self.requests.client().post(&path, &()).await
    }

    pub async fn reject(&self, id: Id, reason: &str) -> Result<WarehouseRequest> {
        if reason.trim().is_empty() {
            return Err(PolyclinicError::validation("A rejection needs a reason"));
        }
        let path = format!("{}/{}/reject", WarehouseRequest::PATH, id);
        self.requests
            .client()
            .post(&path, &Rejection { reason: reason.trim() })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::credentials::CredentialStore;
    use crate::types::RequestStatus;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(id: i64, department: i64, destination: Option<i64>, status: RequestStatus) -> WarehouseRequest {
        WarehouseRequest {
            id,
            department_id: department,
            destination_id: destination,
            lines: vec![RequestLine { medication_id: 1, quantity: 5 }],
            status,
            created_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_validate_rejects_bad_drafts() {
        let mut draft = RequestDraft::default();
        assert!(draft.validate().is_err());

        draft.department_id = Some(2);
        assert!(draft.validate().is_err());

        draft.add_line(1, 0);
        let err = draft.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid quantity"));

        let mut draft = RequestDraft::for_department(2);
        draft.add_line(1, 10);
        draft.add_line(1, 5);
        assert!(draft.validate().unwrap_err().to_string().contains("twice"));

        let mut draft = RequestDraft::for_department(2);
        draft.add_line(1, 10);
        draft.add_line(3, 5);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_pending_for_department() {
        let requests = vec![
            request(1, 2, None, RequestStatus::Pending),
            request(2, 3, Some(2), RequestStatus::OriginApproved),
            request(3, 2, None, RequestStatus::Delivered),
            request(4, 5, None, RequestStatus::Pending),
        ];
        let ids: Vec<i64> = pending_for(requests, 2).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_submit_sends_camel_case_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/warehouse-requests"))
            .and(body_json(json!({
                "departmentId": 2,
                "destinationId": null,
                "lines": [{"medicationId": 1, "quantity": 10}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "id": 11,
                    "departmentId": 2,
                    "destinationId": null,
                    "lines": [{"medicationId": 1, "quantity": 10}],
                    "status": "PENDING",
                    "createdAt": "2024-06-01T08:00:00"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token"));
        let warehouse = Warehouse::new(ApiClient::new(&server.uri(), store, Duration::from_secs(5)).unwrap());

        let mut draft = RequestDraft::for_department(2);
        draft.add_line(1, 10);
        let created = warehouse.submit(&draft).await.unwrap();
        assert_eq!(created.id, 11);
        assert_eq!(created.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token"));
        let warehouse = Warehouse::new(ApiClient::new(&server.uri(), store, Duration::from_secs(5)).unwrap());

        let err = warehouse.submit(&RequestDraft::for_department(2)).await.unwrap_err();
        assert!(err.is_client_side());
        assert!(warehouse.reject(4, "  ").await.unwrap_err().is_client_side());
    }
}
