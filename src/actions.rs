//! Validated forms and the document mutations the screens perform.
//!
//! Forms are parsed from raw text fields before anything touches the
//! document, so a mutation either applies completely or not at all.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use color_eyre::{eyre::eyre, Result};
use std::path::Path;

use crate::model::{unique_id, Client, Document, Job, JobStatus, Material, MaterialLine, Settings};

/// Photos above this size need an explicit confirmation.
pub const LARGE_PHOTO_BYTES: usize = 2 * 1024 * 1024;
/// How many upcoming jobs the dashboard lists.
pub const UPCOMING_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
  #[error("{0} is required")]
  Required(&'static str),
  #[error("{field} must be a number, got '{value}'")]
  NotANumber { field: &'static str, value: String },
  #[error("{0} cannot be negative")]
  Negative(&'static str),
  #[error("Quantity must be greater than zero")]
  NonPositiveQuantity,
  #[error("Unknown client")]
  UnknownClient,
  #[error("Unknown material")]
  UnknownMaterial,
  #[error("Unknown job")]
  UnknownJob,
}

/// Parse a non-negative decimal; blank input is zero.
fn parse_amount(field: &'static str, raw: &str) -> Result<f64, FormError> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Ok(0.0);
  }
  let value: f64 = raw.parse().map_err(|_| FormError::NotANumber {
    field,
    value: raw.to_string(),
  })?;
  if !value.is_finite() {
    return Err(FormError::NotANumber {
      field,
      value: raw.to_string(),
    });
  }
  if value < 0.0 {
    return Err(FormError::Negative(field));
  }
  Ok(value)
}

fn required(field: &'static str, raw: &str) -> Result<String, FormError> {
  let value = raw.trim();
  if value.is_empty() {
    Err(FormError::Required(field))
  } else {
    Ok(value.to_string())
  }
}

// ============================================================================
// Clients
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ClientForm {
  pub name: String,
  pub phone: String,
  pub email: String,
  pub address: String,
}

impl ClientForm {
  pub fn parse(name: &str, phone: &str, email: &str, address: &str) -> Result<Self, FormError> {
    Ok(Self {
      name: required("Name", name)?,
      phone: phone.trim().to_string(),
      email: email.trim().to_string(),
      address: address.trim().to_string(),
    })
  }
}

pub fn add_client(doc: &mut Document, form: ClientForm, now: DateTime<Utc>) -> String {
  let id = unique_id("client", doc.clients.iter().map(|c| c.id.as_str()));
  doc.clients.push(Client {
    id: id.clone(),
    name: form.name,
    phone: form.phone,
    email: form.email,
    address: form.address,
    created_at: now,
  });
  id
}

pub fn update_client(doc: &mut Document, id: &str, form: ClientForm) -> Result<(), FormError> {
  let client = doc
    .clients
    .iter_mut()
    .find(|c| c.id == id)
    .ok_or(FormError::UnknownClient)?;
  client.name = form.name;
  client.phone = form.phone;
  client.email = form.email;
  client.address = form.address;
  Ok(())
}

/// Display name for a job's client reference.
pub fn client_name<'a>(doc: &'a Document, id: Option<&str>) -> &'a str {
  id.and_then(|id| doc.client(id))
    .map(|c| c.name.as_str())
    .unwrap_or("No client")
}

// ============================================================================
// Materials
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialForm {
  pub name: String,
  pub unit_price: f64,
}

impl MaterialForm {
  pub fn parse(name: &str, unit_price: &str) -> Result<Self, FormError> {
    Ok(Self {
      name: required("Name", name)?,
      unit_price: parse_amount("Unit price", unit_price)?,
    })
  }
}

pub fn add_material(doc: &mut Document, form: MaterialForm, now: DateTime<Utc>) -> String {
  let id = unique_id("mat", doc.materials.iter().map(|m| m.id.as_str()));
  doc.materials.push(Material {
    id: id.clone(),
    name: form.name,
    unit_price: form.unit_price,
    created_at: now,
  });
  id
}

/// Change a material's price. Lines already on jobs keep their snapshot.
pub fn set_material_price(doc: &mut Document, id: &str, raw_price: &str) -> Result<(), FormError> {
  let price = parse_amount("Unit price", raw_price)?;
  let material = doc
    .materials
    .iter_mut()
    .find(|m| m.id == id)
    .ok_or(FormError::UnknownMaterial)?;
  material.unit_price = price;
  Ok(())
}

/// A strictly positive quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity(f64);

impl Quantity {
  pub fn parse(raw: &str) -> Result<Self, FormError> {
    let value = parse_amount("Quantity", raw)?;
    if value <= 0.0 {
      return Err(FormError::NonPositiveQuantity);
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> f64 {
    self.0
  }
}

/// Append a material line to a job, copying the material's current name
/// and unit price.
pub fn add_material_to_job(
  doc: &mut Document,
  job_id: &str,
  material_id: &str,
  quantity: Quantity,
) -> Result<(), FormError> {
  let material = doc.material(material_id).ok_or(FormError::UnknownMaterial)?;
  let line = MaterialLine {
    material_id: material.id.clone(),
    name: material.name.clone(),
    quantity: quantity.value(),
    price: material.unit_price,
  };
  doc
    .job_mut(job_id)
    .ok_or(FormError::UnknownJob)?
    .materials
    .push(line);
  Ok(())
}

// ============================================================================
// Jobs
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct JobForm {
  pub title: String,
  pub client_id: Option<String>,
  pub address: String,
  pub quote: f64,
  pub hours: f64,
  pub notes: String,
}

/// Raw text fields of the job form.
#[derive(Debug, Clone, Default)]
pub struct JobFormInput<'a> {
  pub title: &'a str,
  pub client_id: Option<&'a str>,
  pub address: &'a str,
  pub quote: &'a str,
  pub hours: &'a str,
  pub notes: &'a str,
}

impl JobForm {
  /// Validate raw input against `doc` (the client must exist).
  pub fn parse(doc: &Document, input: JobFormInput<'_>) -> Result<Self, FormError> {
    let client_id = match input.client_id.map(str::trim).filter(|id| !id.is_empty()) {
      Some(id) => {
        doc.client(id).ok_or(FormError::UnknownClient)?;
        Some(id.to_string())
      }
      None => None,
    };

    Ok(Self {
      title: required("Title", input.title)?,
      client_id,
      address: input.address.trim().to_string(),
      quote: parse_amount("Quote", input.quote)?,
      hours: parse_amount("Hours", input.hours)?,
      notes: input.notes.trim().to_string(),
    })
  }
}

/// Create a pending job at the top of the list.
pub fn create_job(doc: &mut Document, form: JobForm, now: DateTime<Utc>) -> String {
  let id = unique_id("job", doc.jobs.iter().map(|j| j.id.as_str()));
  doc.jobs.insert(
    0,
    Job {
      id: id.clone(),
      title: form.title,
      client_id: form.client_id,
      address: form.address,
      notes: form.notes,
      status: JobStatus::Pending,
      quote: form.quote,
      hours: form.hours,
      materials: Vec::new(),
      photos: Vec::new(),
      start_date: None,
      end_date: None,
      created_at: now,
    },
  );
  id
}

pub fn edit_job(doc: &mut Document, id: &str, form: JobForm) -> Result<(), FormError> {
  let job = doc.job_mut(id).ok_or(FormError::UnknownJob)?;
  job.title = form.title;
  job.client_id = form.client_id;
  job.address = form.address;
  job.quote = form.quote;
  job.hours = form.hours;
  job.notes = form.notes;
  Ok(())
}

pub fn delete_job(doc: &mut Document, id: &str) -> bool {
  let before = doc.jobs.len();
  doc.jobs.retain(|j| j.id != id);
  doc.jobs.len() != before
}

/// The start/stop button: a running job completes, anything else starts.
pub fn advance_job(doc: &mut Document, id: &str, now: DateTime<Utc>) -> Result<JobStatus, FormError> {
  let job = doc.job_mut(id).ok_or(FormError::UnknownJob)?;
  if job.status == JobStatus::InProgress {
    job.status = JobStatus::Completed;
    job.end_date = Some(now);
  } else {
    job.status = JobStatus::InProgress;
    job.start_date = Some(now);
  }
  Ok(job.status)
}

/// Write a status directly. Transitions are not checked.
pub fn set_job_status(doc: &mut Document, id: &str, status: JobStatus) -> Result<(), FormError> {
  doc.job_mut(id).ok_or(FormError::UnknownJob)?.status = status;
  Ok(())
}

/// Jobs whose title, notes or client name contain `query`
/// (case-insensitive), optionally restricted to one status.
pub fn filter_jobs<'a>(doc: &'a Document, query: &str, status: Option<JobStatus>) -> Vec<&'a Job> {
  let query = query.trim().to_lowercase();
  doc
    .jobs
    .iter()
    .filter(|job| {
      let matches_query = query.is_empty()
        || job.title.to_lowercase().contains(&query)
        || job.notes.to_lowercase().contains(&query)
        || client_name(doc, job.client_id.as_deref())
          .to_lowercase()
          .contains(&query);
      let matches_status = status.map_or(true, |s| job.status == s);
      matches_query && matches_status
    })
    .collect()
}

/// Jobs starting on `today`, compared as UTC calendar days.
pub fn jobs_today(doc: &Document, today: NaiveDate) -> Vec<&Job> {
  doc
    .jobs
    .iter()
    .filter(|job| job.start_date.is_some_and(|d| d.date_naive() == today))
    .collect()
}

/// Unscheduled jobs and jobs starting today or later, capped at
/// [`UPCOMING_LIMIT`].
pub fn upcoming_jobs(doc: &Document, today: NaiveDate) -> Vec<&Job> {
  doc
    .jobs
    .iter()
    .filter(|job| job.start_date.map_or(true, |d| d.date_naive() >= today))
    .take(UPCOMING_LIMIT)
    .collect()
}

// ============================================================================
// Photos
// ============================================================================

/// A photo read from disk, ready to attach.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoUpload {
  pub data_url: String,
  pub size: usize,
}

impl PhotoUpload {
  pub fn is_large(&self) -> bool {
    self.size > LARGE_PHOTO_BYTES
  }
}

/// Read an image file into a `data:` URL.
pub fn load_photo(path: &Path) -> Result<PhotoUpload> {
  let bytes =
    std::fs::read(path).map_err(|e| eyre!("Failed to read photo {}: {}", path.display(), e))?;
  let mime = image_mime(path).ok_or_else(|| eyre!("Not an image file: {}", path.display()))?;

  Ok(PhotoUpload {
    data_url: format!("data:{};base64,{}", mime, B64.encode(&bytes)),
    size: bytes.len(),
  })
}

fn image_mime(path: &Path) -> Option<&'static str> {
  let ext = path.extension()?.to_str()?.to_ascii_lowercase();
  match ext.as_str() {
    "jpg" | "jpeg" => Some("image/jpeg"),
    "png" => Some("image/png"),
    "gif" => Some("image/gif"),
    "webp" => Some("image/webp"),
    "heic" => Some("image/heic"),
    _ => None,
  }
}

pub fn add_photo(doc: &mut Document, job_id: &str, data_url: String) -> Result<(), FormError> {
  doc
    .job_mut(job_id)
    .ok_or(FormError::UnknownJob)?
    .photos
    .push(data_url);
  Ok(())
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
  pub biz_name: String,
  pub vat: f64,
  pub hourly_rate: f64,
}

impl SettingsForm {
  pub fn parse(biz_name: &str, vat: &str, hourly_rate: &str) -> Result<Self, FormError> {
    Ok(Self {
      biz_name: biz_name.trim().to_string(),
      vat: parse_amount("VAT", vat)?,
      hourly_rate: parse_amount("Hourly rate", hourly_rate)?,
    })
  }
}

pub fn update_settings(doc: &mut Document, form: SettingsForm) {
  doc.settings = Settings {
    biz_name: form.biz_name,
    vat: form.vat,
    hourly_rate: form.hourly_rate,
  };
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
  }

  fn job_form(doc: &Document, title: &str) -> JobForm {
    JobForm::parse(
      doc,
      JobFormInput {
        title,
        quote: "100",
        hours: "2",
        ..Default::default()
      },
    )
    .unwrap()
  }

  #[test]
  fn test_line_item_price_is_a_snapshot() {
    let mut doc = Document::seed();
    let job_id = doc.jobs[0].id.clone();
    let mat_id = doc.materials[0].id.clone();

    add_material_to_job(&mut doc, &job_id, &mat_id, Quantity::parse("2").unwrap()).unwrap();
    set_material_price(&mut doc, &mat_id, "999.99").unwrap();

    let line = doc.job(&job_id).unwrap().materials.last().unwrap();
    assert_eq!(line.price, 450.0);
    assert_eq!(line.quantity, 2.0);
    assert_eq!(doc.material(&mat_id).unwrap().unit_price, 999.99);
  }

  #[test]
  fn test_quantity_must_be_positive() {
    assert_eq!(Quantity::parse("0"), Err(FormError::NonPositiveQuantity));
    assert_eq!(Quantity::parse(""), Err(FormError::NonPositiveQuantity));
    assert_eq!(Quantity::parse("-1"), Err(FormError::Negative("Quantity")));
    assert!(matches!(
      Quantity::parse("two"),
      Err(FormError::NotANumber { .. })
    ));
    assert_eq!(Quantity::parse("1.5").unwrap().value(), 1.5);
  }

  #[test]
  fn test_add_material_to_unknown_job() {
    let mut doc = Document::seed();
    let mat_id = doc.materials[0].id.clone();
    let qty = Quantity::parse("1").unwrap();
    assert_eq!(
      add_material_to_job(&mut doc, "job_missing", &mat_id, qty),
      Err(FormError::UnknownJob)
    );
    let job_id = doc.jobs[0].id.clone();
    assert_eq!(
      add_material_to_job(&mut doc, &job_id, "mat_missing", qty),
      Err(FormError::UnknownMaterial)
    );
  }

  #[test]
  fn test_create_job_goes_first_and_is_pending() {
    let mut doc = Document::seed();
    let form = job_form(&doc, "Bathroom refit");
    let id = create_job(&mut doc, form, at(2024, 5, 1));

    assert_eq!(doc.jobs.len(), 2);
    assert_eq!(doc.jobs[0].id, id);
    assert_eq!(doc.jobs[0].status, JobStatus::Pending);
    assert!(doc.jobs[0].materials.is_empty());
    assert_ne!(doc.jobs[0].id, doc.jobs[1].id);
  }

  #[test]
  fn test_job_form_validation() {
    let doc = Document::seed();
    let client_id = doc.clients[0].id.clone();

    assert_eq!(
      JobForm::parse(&doc, JobFormInput::default()),
      Err(FormError::Required("Title"))
    );
    assert_eq!(
      JobForm::parse(
        &doc,
        JobFormInput {
          title: "x",
          client_id: Some("client_nope"),
          ..Default::default()
        }
      ),
      Err(FormError::UnknownClient)
    );
    assert_eq!(
      JobForm::parse(
        &doc,
        JobFormInput {
          title: "x",
          hours: "-2",
          ..Default::default()
        }
      ),
      Err(FormError::Negative("Hours"))
    );

    let form = JobForm::parse(
      &doc,
      JobFormInput {
        title: "  Boiler service ",
        client_id: Some(client_id.as_str()),
        quote: "",
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(form.title, "Boiler service");
    assert_eq!(form.client_id.as_deref(), Some(client_id.as_str()));
    assert_eq!(form.quote, 0.0);
  }

  #[test]
  fn test_edit_job_keeps_materials_and_status() {
    let mut doc = Document::seed();
    let id = doc.jobs[0].id.clone();
    advance_job(&mut doc, &id, at(2024, 5, 1)).unwrap();

    let form = job_form(&doc, "Renamed");
    edit_job(&mut doc, &id, form).unwrap();

    let job = doc.job(&id).unwrap();
    assert_eq!(job.title, "Renamed");
    assert_eq!(job.client_id, None);
    assert_eq!(job.status, JobStatus::InProgress);
    assert_eq!(job.materials.len(), 1);
  }

  #[test]
  fn test_advance_job_cycle() {
    let mut doc = Document::seed();
    let id = doc.jobs[0].id.clone();

    assert_eq!(
      advance_job(&mut doc, &id, at(2024, 5, 1)).unwrap(),
      JobStatus::InProgress
    );
    assert_eq!(doc.job(&id).unwrap().start_date, Some(at(2024, 5, 1)));

    assert_eq!(
      advance_job(&mut doc, &id, at(2024, 5, 2)).unwrap(),
      JobStatus::Completed
    );
    assert_eq!(doc.job(&id).unwrap().end_date, Some(at(2024, 5, 2)));

    // A completed job can be restarted
    assert_eq!(
      advance_job(&mut doc, &id, at(2024, 5, 3)).unwrap(),
      JobStatus::InProgress
    );
  }

  #[test]
  fn test_set_job_status_is_unchecked() {
    let mut doc = Document::seed();
    let id = doc.jobs[0].id.clone();
    set_job_status(&mut doc, &id, JobStatus::Completed).unwrap();
    set_job_status(&mut doc, &id, JobStatus::Pending).unwrap();
    assert_eq!(doc.job(&id).unwrap().status, JobStatus::Pending);
  }

  #[test]
  fn test_delete_job() {
    let mut doc = Document::seed();
    let id = doc.jobs[0].id.clone();
    assert!(delete_job(&mut doc, &id));
    assert!(!delete_job(&mut doc, &id));
    assert!(doc.jobs.is_empty());
  }

  #[test]
  fn test_filter_jobs() {
    let mut doc = Document::seed();
    let form = job_form(&doc, "Garden tap");
    let new_id = create_job(&mut doc, form, at(2024, 5, 1));
    advance_job(&mut doc, &new_id, at(2024, 5, 1)).unwrap();

    assert_eq!(filter_jobs(&doc, "", None).len(), 2);
    assert_eq!(filter_jobs(&doc, "TAP", None).len(), 2);
    // Matches via notes and client name
    assert_eq!(filter_jobs(&doc, "valves", None).len(), 1);
    assert_eq!(filter_jobs(&doc, "john", None).len(), 1);
    // "No client" is searchable for jobs without one
    assert_eq!(filter_jobs(&doc, "no client", None)[0].id, new_id);

    let running = filter_jobs(&doc, "", Some(JobStatus::InProgress));
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].id, new_id);
  }

  #[test]
  fn test_dashboard_lists() {
    let mut doc = Document::seed();
    let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

    let form = job_form(&doc, "Past");
    let past = create_job(&mut doc, form, at(2024, 5, 1));
    doc.job_mut(&past).unwrap().start_date = Some(at(2024, 5, 1));
    let form = job_form(&doc, "Now");
    let now = create_job(&mut doc, form, at(2024, 5, 1));
    doc.job_mut(&now).unwrap().start_date = Some(at(2024, 5, 10));

    let today_ids: Vec<_> = jobs_today(&doc, today).iter().map(|j| j.id.clone()).collect();
    assert_eq!(today_ids, vec![now.clone()]);

    let upcoming: Vec<_> = upcoming_jobs(&doc, today).iter().map(|j| j.id.clone()).collect();
    assert!(upcoming.contains(&now));
    assert!(!upcoming.contains(&past));
    // The unscheduled seed job counts as upcoming
    assert_eq!(upcoming.len(), 2);
  }

  #[test]
  fn test_today_uses_utc_day_near_midnight() {
    let mut doc = Document::seed();
    let late = Utc.with_ymd_and_hms(2024, 5, 10, 23, 59, 30).unwrap();
    doc.jobs[0].start_date = Some(late);

    let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
    let tomorrow = NaiveDate::from_ymd_opt(2024, 5, 11).unwrap();
    assert_eq!(jobs_today(&doc, today).len(), 1);
    assert!(jobs_today(&doc, tomorrow).is_empty());
    assert!(upcoming_jobs(&doc, tomorrow).is_empty());
  }

  #[test]
  fn test_upcoming_is_capped() {
    let mut doc = Document::default();
    for i in 0..15 {
      let form = job_form(&doc, &format!("Job {}", i));
      create_job(&mut doc, form, at(2024, 5, 1));
    }
    let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
    assert_eq!(upcoming_jobs(&doc, today).len(), UPCOMING_LIMIT);
  }

  #[test]
  fn test_clients() {
    let mut doc = Document::default();
    assert_eq!(
      ClientForm::parse(" ", "", "", ""),
      Err(FormError::Required("Name"))
    );

    let id = add_client(
      &mut doc,
      ClientForm::parse("Ann", "0123", "ann@example.com", "").unwrap(),
      at(2024, 1, 1),
    );
    assert_eq!(client_name(&doc, Some(&id)), "Ann");
    assert_eq!(client_name(&doc, None), "No client");
    assert_eq!(client_name(&doc, Some("client_gone")), "No client");

    update_client(
      &mut doc,
      &id,
      ClientForm::parse("Ann Smith", "0123", "", "").unwrap(),
    )
    .unwrap();
    assert_eq!(doc.client(&id).unwrap().name, "Ann Smith");
  }

  #[test]
  fn test_materials() {
    let mut doc = Document::default();
    assert_eq!(
      MaterialForm::parse("Pipe", "-3"),
      Err(FormError::Negative("Unit price"))
    );
    let id = add_material(
      &mut doc,
      MaterialForm::parse("Pipe", "3.20").unwrap(),
      at(2024, 1, 1),
    );
    assert_eq!(doc.material(&id).unwrap().unit_price, 3.2);
    assert!(set_material_price(&mut doc, &id, "abc").is_err());
    assert_eq!(doc.material(&id).unwrap().unit_price, 3.2);
  }

  #[test]
  fn test_settings_form() {
    let mut doc = Document::default();
    let form = SettingsForm::parse("Acme Plumbing", "20", "45.50").unwrap();
    update_settings(&mut doc, form);
    assert_eq!(doc.settings.biz_name, "Acme Plumbing");
    assert_eq!(doc.settings.vat, 20.0);
    assert_eq!(doc.settings.hourly_rate, 45.5);
    assert!(SettingsForm::parse("x", "NaN", "0").is_err());
  }

  #[test]
  fn test_load_photo() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tap.PNG");
    std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

    let photo = load_photo(&path).unwrap();
    assert_eq!(photo.data_url, "data:image/png;base64,iVBORw==");
    assert_eq!(photo.size, 4);
    assert!(!photo.is_large());

    let text = dir.path().join("notes.txt");
    std::fs::write(&text, "hello").unwrap();
    assert!(load_photo(&text).is_err());

    let mut doc = Document::seed();
    let job_id = doc.jobs[0].id.clone();
    add_photo(&mut doc, &job_id, photo.data_url).unwrap();
    assert_eq!(doc.jobs[0].photos.len(), 1);
  }
}
