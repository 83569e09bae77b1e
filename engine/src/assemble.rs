//! Stage four: lookups keyed off stage-three results, then the final merge.
//!
//! No sub-query starts before its inputs resolve. A sub-query whose input
//! failed is skipped with [`FetchError::DependencyUnresolved`] and its snapshot
//! field keeps its default.

use beacon_types::{
    AccountRef, Asset, BalanceRecord, FieldFailure, LinkField, PersonSummary, Principals,
    ProjectSummary, SessionToken, Snapshot,
};
use beacon_upstream::endpoints::{
    EntityRecord, GetEntity, GetInvestor, PlatformUser, ProjectRecord, RecipientRecord,
    ValidateRecipient,
};
use beacon_upstream::{Endpoint, FetchError};
use chrono::{DateTime, Utc};

use crate::aggregate::{Aggregator, Sessions, settle};
use crate::collect::Collected;

const NOT_YET_PAID: &str = "First Payment not yet made";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

impl Aggregator {
    /// Run every stage-four query concurrently, wait for all of them, and
    /// merge everything into one snapshot.
    ///
    /// `failures` carries the failures of earlier stages. Probe results are
    /// merged by the caller.
    pub async fn assemble(
        &self,
        sessions: &Sessions,
        collected: Collected,
        mut failures: Vec<FieldFailure>,
        now: DateTime<Utc>,
    ) -> Snapshot {
        let stable = self.settings.stable_asset.as_str();
        let project = collected.project.as_ref();
        let user = collected
            .recipient
            .as_ref()
            .and_then(RecipientRecord::validated_user);

        let debt_code = project.and_then(|p| non_empty(&p.debt_asset_code));
        let payback_code = project.and_then(|p| non_empty(&p.payback_asset_code));
        let primary_codes = [Some(stable), debt_code, payback_code]
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();

        let primary =
            user.and_then(|u| AccountRef::new(u.stellar_wallet.public_key.as_str(), primary_codes));
        let secondary = user.and_then(|u| {
            AccountRef::new(
                u.secondary_wallet.public_key.as_str(),
                vec![stable.to_string()],
            )
        });
        let escrow =
            project.and_then(|p| AccountRef::new(p.escrow_pubkey.as_str(), vec![stable.to_string()]));

        let price = collected.xlm_usd;
        let admin = sessions.admin.as_ref();
        let investor_index = project.and_then(|p| p.investor_indices.first().copied());
        let developer_index = project.and_then(|p| p.developer_indices.first().copied());

        let (
            primary_native,
            primary_stable,
            secondary_native,
            secondary_stable,
            debt,
            payback,
            escrow_stable,
            investor,
            developer,
        ) = tokio::join!(
            self.native_usd(primary.as_ref(), price),
            self.issued(primary.as_ref(), Some(stable)),
            self.native_usd(secondary.as_ref(), price),
            self.issued(secondary.as_ref(), Some(stable)),
            self.issued(primary.as_ref(), debt_code),
            self.issued(primary.as_ref(), payback_code),
            self.issued(escrow.as_ref(), Some(stable)),
            self.entity::<GetInvestor>(admin, investor_index),
            self.entity::<GetEntity>(admin, developer_index),
        );

        let primary_native = settle("balances.primary.native", primary_native, &mut failures);
        let primary_stable = settle("balances.primary.stable", primary_stable, &mut failures);
        let secondary_native = settle("balances.secondary.native", secondary_native, &mut failures);
        let secondary_stable = settle("balances.secondary.stable", secondary_stable, &mut failures);
        let debt = settle("debt_balance", debt, &mut failures);
        let payback = settle("payback_balance", payback, &mut failures);
        let escrow_stable = settle("escrow_balance", escrow_stable, &mut failures);
        let investor = settle("investor", investor, &mut failures);
        let developer = settle("developer", developer, &mut failures);

        let generated_at = now.format(TIMESTAMP_FORMAT).to_string();
        let mut snapshot = Snapshot {
            title: self.settings.title.clone(),
            principals: Principals {
                recipient: self.settings.recipient.username().to_string(),
                admin: self.settings.admin.username().to_string(),
            },
            counts: collected.counts,
            investor: investor.unwrap_or_default(),
            developer: developer.unwrap_or_default(),
            ..Snapshot::default()
        };

        if let Some(record) = &collected.recipient {
            let link = self.platform.endpoint_url::<ValidateRecipient>(&[(
                "username",
                self.settings.recipient.username(),
            )]);
            apply_recipient(&mut snapshot, record, link.as_str(), &generated_at);
        }
        if let Some(project) = project {
            apply_project(&mut snapshot, project);
        }

        if let Some(account) = &primary {
            snapshot.primary_account = LinkField::new(
                account_text(primary_native.as_ref(), primary_stable.as_ref(), stable),
                self.explorer_link(account.public_key()),
            );
        }
        if let Some(account) = &secondary {
            snapshot.secondary_account = LinkField::new(
                account_text(secondary_native.as_ref(), secondary_stable.as_ref(), stable),
                self.explorer_link(account.public_key()),
            );
        }
        snapshot.debt_balance = self.balance_field(debt.as_ref());
        snapshot.payback_balance = self.balance_field(payback.as_ref());
        snapshot.escrow_balance = self.balance_field(escrow_stable.as_ref());

        snapshot.balances = [
            primary_native,
            primary_stable,
            secondary_native,
            secondary_stable,
            debt,
            payback,
            escrow_stable,
        ]
        .into_iter()
        .flatten()
        .collect();
        snapshot.failures = failures;
        snapshot.generated_at = generated_at;
        snapshot
    }

    async fn native_usd(
        &self,
        account: Option<&AccountRef>,
        price: Option<f64>,
    ) -> Result<BalanceRecord, FetchError> {
        let account = account.ok_or_else(|| FetchError::unresolved("account reference"))?;
        let price = price.ok_or_else(|| FetchError::unresolved("xlm price"))?;
        let native = self.ledger.native_balance(account.public_key()).await?;
        Ok(BalanceRecord::new(account, Asset::Native, native * price))
    }

    async fn issued(
        &self,
        account: Option<&AccountRef>,
        code: Option<&str>,
    ) -> Result<BalanceRecord, FetchError> {
        let account = account.ok_or_else(|| FetchError::unresolved("account reference"))?;
        let code = code.ok_or_else(|| FetchError::unresolved("project asset code"))?;
        let amount = self.ledger.asset_balance(account.public_key(), code).await?;
        Ok(BalanceRecord::new(
            account,
            Asset::Issued(code.to_string()),
            amount,
        ))
    }

    async fn entity<E>(
        &self,
        token: Option<&SessionToken>,
        index: Option<i64>,
    ) -> Result<PersonSummary, FetchError>
    where
        E: Endpoint<Response = EntityRecord>,
    {
        let token = token.ok_or_else(|| FetchError::unresolved("admin token"))?;
        let index = index.ok_or_else(|| FetchError::unresolved("project entity index"))?;
        let index = index.to_string();
        let record = self
            .platform
            .call::<E>(&[
                ("username", self.settings.admin.username()),
                ("token", token.expose_secret()),
                ("index", index.as_str()),
            ])
            .await?;
        Ok(record.user.as_ref().map(person).unwrap_or_default())
    }

    fn explorer_link(&self, public_key: &str) -> String {
        format!(
            "{}/{public_key}",
            self.settings.explorer_url.as_str().trim_end_matches('/')
        )
    }

    fn balance_field(&self, record: Option<&BalanceRecord>) -> LinkField {
        record
            .map(|r| LinkField::new(r.display_amount(), self.explorer_link(r.account())))
            .unwrap_or_default()
    }
}

fn apply_recipient(
    snapshot: &mut Snapshot,
    record: &RecipientRecord,
    validate_link: &str,
    generated_at: &str,
) {
    let validation = match record.validated_user() {
        Some(user) => {
            snapshot.recipient = person(user);
            "Validated Recipient"
        }
        None => "Could not validate Recipient",
    };
    snapshot.validate = LinkField::new(validation, validate_link);

    let interval = if record.next_payment_interval.is_empty() {
        NOT_YET_PAID
    } else {
        record.next_payment_interval.as_str()
    };
    snapshot.next_interval = LinkField::text(format!("Next Payment Interval: {interval}"));
    snapshot.teller_energy = LinkField::text(format!(
        "Energy generated till {generated_at} is: {} Wh",
        record.teller_energy
    ));
    if let Some(start) = record.device_starts.last() {
        snapshot.date_last_start =
            LinkField::text(format!("Last Boot Time: {}", human_time_str(start)));
    }
    snapshot.device_id = LinkField::text(record.device_id.as_str());
    snapshot.past_energy_values = record.past_teller_energy.clone();
    snapshot.device_location = record.device_location.clone();
    snapshot.state_hashes = record.state_hashes.clone();
}

fn apply_project(snapshot: &mut Snapshot, project: &ProjectRecord) {
    let last_paid = if project.date_last_paid == 0 {
        NOT_YET_PAID.to_string()
    } else {
        human_time(project.date_last_paid).unwrap_or_else(|| project.date_last_paid.to_string())
    };
    snapshot.date_last_paid = LinkField::text(format!("Date Last Paid: {last_paid}"));
    snapshot.project = ProjectSummary {
        index: project.index,
        payback_period: project.payback_period,
        balance_left: project.bal_left,
        ownership_shift: project.ownership_shift,
        date_initiated: project.date_initiated.clone(),
        date_funded: project.date_funded.clone(),
        stage: project.stage,
        investor_asset_code: project.investor_asset_code.clone(),
    };
}

fn person(user: &PlatformUser) -> PersonSummary {
    PersonSummary {
        name: user.name.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
    }
}

fn account_text(native: Option<&BalanceRecord>, stable: Option<&BalanceRecord>, code: &str) -> String {
    let amount = |r: Option<&BalanceRecord>| {
        r.map_or_else(|| crate::render::UNAVAILABLE.to_string(), BalanceRecord::display_amount)
    };
    format!("XLM: {} {code}: {}", amount(native), amount(stable))
}

fn non_empty(value: &str) -> Option<&str> {
    if value.trim().is_empty() { None } else { Some(value) }
}

fn human_time(unix_secs: i64) -> Option<String> {
    DateTime::from_timestamp(unix_secs, 0).map(|t| t.format(TIMESTAMP_FORMAT).to_string())
}

/// Device start times arrive as unix-second strings.
fn human_time_str(raw: &str) -> String {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(human_time)
        .unwrap_or_else(|| raw.to_string())
}
