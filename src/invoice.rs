//! Invoice totals for a job.

use crate::actions::client_name;
use crate::model::{Document, Job};

/// Money breakdown of a job under the current settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvoiceSummary {
  pub quote: f64,
  pub materials: f64,
  pub labour: f64,
  pub subtotal: f64,
  pub vat_percent: f64,
  pub vat: f64,
  pub total: f64,
}

impl InvoiceSummary {
  pub fn for_job(doc: &Document, job: &Job) -> Self {
    let materials: f64 = job.materials.iter().map(|m| m.line_total()).sum();
    let labour = job.hours * doc.settings.hourly_rate;
    let subtotal = job.quote + materials + labour;
    let vat_percent = doc.settings.vat;
    let vat = subtotal * (vat_percent / 100.0);

    Self {
      quote: job.quote,
      materials,
      labour,
      subtotal,
      vat_percent,
      vat,
      total: subtotal + vat,
    }
  }
}

/// Format an amount with a currency symbol and two decimals.
pub fn money(currency: &str, amount: f64) -> String {
  format!("{}{:.2}", currency, amount)
}

/// Plain-text invoice for display or copying.
pub fn render_text(doc: &Document, job: &Job, currency: &str) -> Vec<String> {
  let summary = InvoiceSummary::for_job(doc, job);
  let mut lines = Vec::new();

  if !doc.settings.biz_name.is_empty() {
    lines.push(doc.settings.biz_name.clone());
  }
  lines.push("INVOICE".to_string());
  lines.push(String::new());
  lines.push(format!("Job:      {}", job.title));
  lines.push(format!(
    "Client:   {}",
    client_name(doc, job.client_id.as_deref())
  ));
  lines.push(format!("Address:  {}", job.address));
  lines.push(String::new());
  lines.push(format!("Quote:     {}", money(currency, summary.quote)));
  lines.push(format!("Materials: {}", money(currency, summary.materials)));
  lines.push(format!("Labour:    {}", money(currency, summary.labour)));
  lines.push(format!("Subtotal:  {}", money(currency, summary.subtotal)));
  lines.push(format!(
    "VAT {}%:   {}",
    summary.vat_percent,
    money(currency, summary.vat)
  ));
  lines.push(String::new());
  lines.push(format!("Total:     {}", money(currency, summary.total)));
  lines
}
