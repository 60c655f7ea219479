mod client_list;
mod dashboard;
mod job_detail;
mod job_form;
mod job_list;
mod login;
mod material_list;
mod settings;

pub use client_list::ClientListView;
pub use dashboard::DashboardView;
pub use job_detail::JobDetailView;
pub use job_form::JobFormView;
pub use job_list::JobListView;
pub use login::LoginView;
pub use material_list::MaterialListView;
pub use settings::SettingsView;
