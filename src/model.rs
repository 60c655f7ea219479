//! Business records held in the persisted document.
//!
//! Field names serialize in the same camelCase shape as the exported JSON
//! files, so exports and imports stay interchangeable.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

/// A customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub address: String,
  pub created_at: DateTime<Utc>,
}

/// A priced catalogue item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
  pub id: String,
  pub name: String,
  #[serde(default, deserialize_with = "number_or_zero")]
  pub unit_price: f64,
  pub created_at: DateTime<Utc>,
}

/// Job progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
  #[default]
  Pending,
  InProgress,
  Completed,
}

impl JobStatus {
  pub const ALL: [JobStatus; 3] = [
    JobStatus::Pending,
    JobStatus::InProgress,
    JobStatus::Completed,
  ];

  /// Wire name, as stored in the document
  pub fn as_str(&self) -> &'static str {
    match self {
      JobStatus::Pending => "pending",
      JobStatus::InProgress => "in_progress",
      JobStatus::Completed => "completed",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      JobStatus::Pending => "Pending",
      JobStatus::InProgress => "In progress",
      JobStatus::Completed => "Completed",
    }
  }
}

/// A material used on a job. `name` and `price` are copied from the
/// material when the line is added and never follow later edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
  #[serde(rename = "id")]
  pub material_id: String,
  pub name: String,
  #[serde(rename = "qty", default, deserialize_with = "number_or_zero")]
  pub quantity: f64,
  #[serde(default, deserialize_with = "number_or_zero")]
  pub price: f64,
}

impl MaterialLine {
  pub fn line_total(&self) -> f64 {
    self.quantity * self.price
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub client_id: Option<String>,
  #[serde(default)]
  pub address: String,
  #[serde(default)]
  pub notes: String,
  #[serde(default)]
  pub status: JobStatus,
  #[serde(default, deserialize_with = "number_or_zero")]
  pub quote: f64,
  #[serde(default, deserialize_with = "number_or_zero")]
  pub hours: f64,
  #[serde(default)]
  pub materials: Vec<MaterialLine>,
  /// Photos inlined as `data:` URLs
  #[serde(default)]
  pub photos: Vec<String>,
  #[serde(default)]
  pub start_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub end_date: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
  #[serde(default)]
  pub biz_name: String,
  /// VAT percentage
  #[serde(default, deserialize_with = "number_or_zero")]
  pub vat: f64,
  #[serde(default, deserialize_with = "number_or_zero")]
  pub hourly_rate: f64,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      biz_name: "Your Business".to_string(),
      vat: 0.0,
      hourly_rate: 0.0,
    }
  }
}

/// The aggregate of everything the app stores; the unit of persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
  #[serde(default)]
  pub clients: Vec<Client>,
  #[serde(default)]
  pub materials: Vec<Material>,
  #[serde(default)]
  pub jobs: Vec<Job>,
  #[serde(default)]
  pub settings: Settings,
}

impl Document {
  /// First-run document: one client, one material and one job using both.
  pub fn seed() -> Self {
    let now = Utc::now();

    let client = Client {
      id: new_id("client"),
      name: "John Smith".to_string(),
      phone: "07111 222333".to_string(),
      email: String::new(),
      address: "12 High St".to_string(),
      created_at: now,
    };

    let material = Material {
      id: new_id("mat"),
      name: "Boiler".to_string(),
      unit_price: 450.0,
      created_at: now,
    };

    let job = Job {
      id: new_id("job"),
      title: "Kitchen Tap Replacement".to_string(),
      client_id: Some(client.id.clone()),
      address: "12 High St, London".to_string(),
      notes: "Replace tap; check valves.".to_string(),
      status: JobStatus::Pending,
      quote: 150.0,
      hours: 1.5,
      materials: vec![MaterialLine {
        material_id: material.id.clone(),
        name: material.name.clone(),
        quantity: 1.0,
        price: material.unit_price,
      }],
      photos: Vec::new(),
      start_date: None,
      end_date: None,
      created_at: now,
    };

    Self {
      clients: vec![client],
      materials: vec![material],
      jobs: vec![job],
      settings: Settings::default(),
    }
  }

  pub fn client(&self, id: &str) -> Option<&Client> {
    self.clients.iter().find(|c| c.id == id)
  }

  pub fn material(&self, id: &str) -> Option<&Material> {
    self.materials.iter().find(|m| m.id == id)
  }

  pub fn job(&self, id: &str) -> Option<&Job> {
    self.jobs.iter().find(|j| j.id == id)
  }

  pub fn job_mut(&mut self, id: &str) -> Option<&mut Job> {
    self.jobs.iter_mut().find(|j| j.id == id)
  }
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Numeric fields accept `null` as zero, as exported files may carry it.
fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

/// Generate an identifier of the form `<prefix>_<7 base36 chars>`.
pub fn new_id(prefix: &str) -> String {
  let mut rng = rand::thread_rng();
  let suffix: String = (0..7)
    .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
    .collect();
  format!("{}_{}", prefix, suffix)
}

/// Generate an identifier not present in `existing`.
pub fn unique_id<'a, I>(prefix: &str, existing: I) -> String
where
  I: IntoIterator<Item = &'a str> + Clone,
{
  loop {
    let id = new_id(prefix);
    if !existing.clone().into_iter().any(|e| e == id) {
      return id;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_seed_structure() {
    let doc = Document::seed();
    assert_eq!(doc.clients.len(), 1);
    assert_eq!(doc.materials.len(), 1);
    assert_eq!(doc.jobs.len(), 1);

    let job = &doc.jobs[0];
    assert_eq!(job.client_id.as_deref(), Some(doc.clients[0].id.as_str()));
    assert_eq!(job.materials[0].material_id, doc.materials[0].id);
    assert_eq!(job.materials[0].price, 450.0);
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(doc.settings.biz_name, "Your Business");
  }

  #[test]
  fn test_new_id_shape() {
    let id = new_id("job");
    assert!(id.starts_with("job_"));
    assert_eq!(id.len(), "job_".len() + 7);
    assert!(id[4..].chars().all(|c| c.is_ascii_alphanumeric()));
  }

  #[test]
  fn test_parses_exported_shape() {
    let json = r#"{
      "clients": [{"id":"client_a","name":"Ann","phone":"1","email":"","createdAt":"2024-03-01T09:00:00.000Z"}],
      "materials": [{"id":"mat_a","name":"Pipe","unitPrice":2.5,"createdAt":"2024-03-01T09:00:00.000Z"}],
      "jobs": [{
        "id":"job_a","title":"Fix","clientId":"client_a","address":"","notes":"",
        "status":"in_progress","quote":10,"hours":2,
        "materials":[{"id":"mat_a","name":"Pipe","qty":3,"price":2.5}],
        "photos":[],"startDate":"2024-03-02T08:00:00.000Z","endDate":null,
        "createdAt":"2024-03-01T09:00:00.000Z"
      }],
      "settings": {"bizName":"Ann's Plumbing","vat":20,"hourlyRate":40}
    }"#;

    let doc: Document = serde_json::from_str(json).unwrap();
    assert_eq!(doc.clients[0].address, "");
    assert_eq!(doc.jobs[0].status, JobStatus::InProgress);
    assert_eq!(doc.jobs[0].materials[0].quantity, 3.0);
    assert_eq!(doc.jobs[0].materials[0].line_total(), 7.5);
    assert!(doc.jobs[0].end_date.is_none());
    assert_eq!(doc.settings.hourly_rate, 40.0);
  }

  #[test]
  fn test_null_numbers_read_as_zero() {
    let json = r#"{
      "materials": [{"id":"mat_a","name":"Pipe","unitPrice":null,"createdAt":"2024-03-01T09:00:00.000Z"}],
      "jobs": [{
        "id":"job_a","title":"Fix","quote":null,"hours":null,
        "materials":[{"id":"mat_a","name":"Pipe","qty":null,"price":null}],
        "createdAt":"2024-03-01T09:00:00.000Z"
      }],
      "settings": {"bizName":"Ann's Plumbing","vat":null,"hourlyRate":null}
    }"#;

    let doc: Document = serde_json::from_str(json).unwrap();
    assert_eq!(doc.materials[0].unit_price, 0.0);
    assert_eq!(doc.jobs[0].quote, 0.0);
    assert_eq!(doc.jobs[0].hours, 0.0);
    assert_eq!(doc.jobs[0].materials[0].line_total(), 0.0);
    assert_eq!(doc.settings.vat, 0.0);
    assert_eq!(doc.settings.hourly_rate, 0.0);
  }

  #[test]
  fn test_serializes_wire_names() {
    let doc = Document::seed();
    let value = serde_json::to_value(&doc).unwrap();
    let job = &value["jobs"][0];
    assert!(job.get("clientId").is_some());
    assert_eq!(job["status"], "pending");
    assert!(job["materials"][0].get("qty").is_some());
    assert!(value["materials"][0].get("unitPrice").is_some());
    assert!(value["settings"].get("bizName").is_some());
  }

  #[test]
  fn test_missing_sections_default() {
    let doc: Document = serde_json::from_str("{}").unwrap();
    assert!(doc.jobs.is_empty());
    assert_eq!(doc.settings, Settings::default());
  }
}
