// app/src/models/notification.rs

//! The subset of a provider webhook the reconciler reads.

use serde::Deserialize;

const APPROVED_EVENT: &str = "CHECKOUT.ORDER.APPROVED";
const APPROVED_STATUS: &str = "APPROVED";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderNotification {
  #[serde(default)]
  pub id: Option<String>,
  #[serde(default)]
  pub event_type: Option<String>,
  #[serde(default)]
  pub resource: Option<NotificationResource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationResource {
  #[serde(default)]
  pub id: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub custom_id: Option<String>,
  #[serde(default)]
  pub purchase_units: Vec<PurchaseUnitRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseUnitRef {
  #[serde(default)]
  pub reference_id: Option<String>,
  #[serde(default)]
  pub custom_id: Option<String>,
}

impl ProviderNotification {
  /// Fails on anything that is not a JSON object of the expected shape.
  pub fn parse(raw: &[u8]) -> Result<Self, serde_json::Error> {
    serde_json::from_slice(raw)
  }

  pub fn is_approval(&self) -> bool {
    let approved_status = self
      .resource
      .as_ref()
      .and_then(|r| r.status.as_deref())
      .is_some_and(|s| s.eq_ignore_ascii_case(APPROVED_STATUS));
    approved_status || self.event_type.as_deref() == Some(APPROVED_EVENT)
  }

  /// `purchase_units[0].reference_id`, then the custom ids. Blank values count as absent.
  pub fn correlation_key(&self) -> Option<&str> {
    let resource = self.resource.as_ref()?;
    let first_unit = resource.purchase_units.first();
    [
      first_unit.and_then(|u| u.reference_id.as_deref()),
      resource.custom_id.as_deref(),
      first_unit.and_then(|u| u.custom_id.as_deref()),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|key| !key.is_empty())
  }

  pub fn event_label(&self) -> &str {
    self.event_type.as_deref().unwrap_or("<none>")
  }
}
