//! Anchoring: handing a signed request to a node that writes it to the ledger.
//!
//! Solving the proof-of-work challenge is left to implementors.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub const DEFAULT_CHALLENGE_ENDPOINT: &str =
    "https://beta.ion.msidentity.com/api/v1.0/proof-of-work-challenge";
pub const DEFAULT_SOLUTION_ENDPOINT: &str = "https://beta.ion.msidentity.com/api/v1.0/operations";

/// Where to fetch a challenge and where to post the solved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorEndpoints {
    pub challenge: String,
    pub solution: String,
}

impl Default for AnchorEndpoints {
    fn default() -> Self {
        Self {
            challenge: DEFAULT_CHALLENGE_ENDPOINT.to_string(),
            solution: DEFAULT_SOLUTION_ENDPOINT.to_string(),
        }
    }
}

/// Submits a request body for anchoring.
#[async_trait]
pub trait AnchorSubmitter: Send + Sync {
    /// Fetch a challenge from `challenge_endpoint`, solve it, and post
    /// `request` with the solution to `solution_endpoint`.
    async fn submit(
        &self,
        request: &Value,
        challenge_endpoint: &str,
        solution_endpoint: &str,
    ) -> Result<Value>;

    /// [`submit`](Self::submit) with a bundled pair of endpoints.
    async fn submit_to(&self, request: &Value, endpoints: &AnchorEndpoints) -> Result<Value> {
        self.submit(request, &endpoints.challenge, &endpoints.solution)
            .await
    }
}
