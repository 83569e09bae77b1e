//! Stage three: queries that need at most a session token.

use beacon_types::{Counts, FieldFailure, LinkField, SessionToken};
use beacon_upstream::endpoints::{
    AllInvestors, AllProjects, AllRecipients, AllUsers, GetProject, LengthResponse, ProjectRecord,
    RecipientRecord, ValidateRecipient,
};
use beacon_upstream::{Endpoint, FetchError};

use crate::aggregate::{Aggregator, Sessions, settle};

/// Partial result set handed from the collector to the assembler.
///
/// Each field is written by exactly one stage-three query.
#[derive(Debug, Default)]
pub struct Collected {
    pub recipient: Option<RecipientRecord>,
    pub project: Option<ProjectRecord>,
    pub counts: Counts,
    pub xlm_usd: Option<f64>,
}

impl Aggregator {
    /// Run every stage-three query concurrently and wait for all of them.
    ///
    /// A query whose token is missing resolves to
    /// [`FetchError::DependencyUnresolved`] without touching the network.
    pub async fn collect(&self, sessions: &Sessions) -> (Collected, Vec<FieldFailure>) {
        let admin = sessions.admin.as_ref();
        let (recipient, project, projects, users, investors, recipients, price) = tokio::join!(
            self.validate_recipient(sessions.user.as_ref()),
            self.project(),
            self.count::<AllProjects>(admin),
            self.count::<AllUsers>(admin),
            self.count::<AllInvestors>(admin),
            self.count::<AllRecipients>(admin),
            self.ticker.xlm_usd(),
        );

        let mut failures = Vec::new();
        let collected = Collected {
            recipient: settle("validate", recipient, &mut failures),
            project: settle("project", project, &mut failures),
            counts: Counts {
                projects: settle("counts.projects", projects, &mut failures).unwrap_or_default(),
                users: settle("counts.users", users, &mut failures).unwrap_or_default(),
                investors: settle("counts.investors", investors, &mut failures)
                    .unwrap_or_default(),
                recipients: settle("counts.recipients", recipients, &mut failures)
                    .unwrap_or_default(),
            },
            xlm_usd: settle("xlm_usd", price, &mut failures),
        };
        (collected, failures)
    }

    async fn validate_recipient(
        &self,
        token: Option<&SessionToken>,
    ) -> Result<RecipientRecord, FetchError> {
        let token = token.ok_or_else(|| FetchError::unresolved("user token"))?;
        let username = self.settings.recipient.username();
        self.platform
            .call::<ValidateRecipient>(&[("username", username), ("token", token.expose_secret())])
            .await
    }

    async fn project(&self) -> Result<ProjectRecord, FetchError> {
        let index = self.settings.project_index.to_string();
        self.platform.call::<GetProject>(&[("index", index.as_str())]).await
    }

    async fn count<E>(&self, token: Option<&SessionToken>) -> Result<LinkField, FetchError>
    where
        E: Endpoint<Response = LengthResponse>,
    {
        let token = token.ok_or_else(|| FetchError::unresolved("admin token"))?;
        let username = self.settings.admin.username();
        let response = self
            .platform
            .call::<E>(&[("username", username), ("token", token.expose_secret())])
            .await?;
        // The link omits the token; it is a credential.
        let link = self.platform.endpoint_url::<E>(&[("username", username)]);
        Ok(LinkField::new(response.length.to_string(), link.to_string()))
    }
}
