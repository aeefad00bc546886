//! CSV exports that open directly in Excel: UTF-8 with a byte order mark,
//! CRLF line endings.

use super::read_model::ClinicSnapshot;
use super::search::{filter_appointments, filter_consultations, filter_patients, filter_prescriptions};
use super::stats::{billing_report, format_amount};
use super::{Document, ExportError, UNKNOWN_PERSON};
use crate::models::enums::AppointmentStatus;
use crate::models::timefmt::{format_date, format_datetime};
use crate::models::{AppointmentFilter, ConsultationFilter, PatientFilter, PrescriptionFilter};

const BOM: &str = "\u{feff}";

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Accumulates rows and turns them into a CSV document.
struct CsvBuilder {
    out: String,
    rows: usize,
}

impl CsvBuilder {
    fn new(header: &[&str]) -> Self {
        let mut builder = Self {
            out: String::from(BOM),
            rows: 0,
        };
        builder.push_line(header.iter().copied());
        builder
    }

    fn push_line<'a>(&mut self, cells: impl IntoIterator<Item = &'a str>) {
        let line: Vec<String> = cells.into_iter().map(escape_csv).collect();
        self.out.push_str(&line.join(","));
        self.out.push_str("\r\n");
    }

    fn row(&mut self, cells: &[String]) {
        self.push_line(cells.iter().map(String::as_str));
        self.rows += 1;
    }

    fn finish(self, filename: &str) -> Result<Document, ExportError> {
        if self.rows == 0 {
            return Err(ExportError::NothingToExport);
        }
        Ok(Document::csv(filename, self.out.into_bytes()))
    }
}

fn or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn status_label(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Confirmed => "Confirmé",
        AppointmentStatus::Cancelled => "Annulé",
        AppointmentStatus::Pending => "En attente",
    }
}

/// Patients matching `filter`, in list order.
pub fn patients_csv(snapshot: &ClinicSnapshot, filter: &PatientFilter) -> Result<Document, ExportError> {
    let mut csv = CsvBuilder::new(&[
        "ID", "CIN", "Nom", "Prénom", "Sexe", "Âge", "Adresse", "Email", "Téléphone",
    ]);
    for p in filter_patients(snapshot, filter) {
        csv.row(&[
            p.id.to_string(),
            or_empty(&p.national_id),
            p.last_name.clone(),
            p.first_name.clone(),
            p.sex.map(|s| s.as_str().to_string()).unwrap_or_default(),
            p.age.to_string(),
            or_empty(&p.address),
            or_empty(&p.email),
            or_empty(&p.phone),
        ]);
    }
    csv.finish("patients.csv")
}

/// One row per patient with their billing totals.
pub fn billing_csv(snapshot: &ClinicSnapshot) -> Result<Document, ExportError> {
    let mut csv = CsvBuilder::new(&[
        "CIN",
        "Nom",
        "Prénom",
        "Téléphone",
        "Email",
        "Total Facturé",
        "Nombre Consultations",
        "Dernière Consultation",
    ]);
    for row in billing_report(snapshot).patients {
        csv.row(&[
            or_empty(&row.cin_patient),
            row.nom.to_uppercase(),
            row.prenom,
            or_empty(&row.telephone),
            or_empty(&row.email),
            row.total_affiche,
            row.nombre_consultations.to_string(),
            row.derniere_consultation
                .map(|d| format_date(&d.date()))
                .unwrap_or_default(),
        ]);
    }
    csv.finish("facturation.csv")
}

pub fn practitioners_csv(snapshot: &ClinicSnapshot) -> Result<Document, ExportError> {
    let mut csv = CsvBuilder::new(&["CIN", "Nom", "Prénom", "Téléphone", "Email", "Spécialité"]);
    for p in &snapshot.practitioners {
        csv.row(&[
            p.national_id.clone(),
            p.last_name.clone(),
            p.first_name.clone(),
            or_empty(&p.phone),
            or_empty(&p.email),
            or_empty(&p.specialty),
        ]);
    }
    csv.finish("praticiens.csv")
}

/// Appointments matching `filter`, earliest first, with the people joined on.
pub fn appointments_csv(
    snapshot: &ClinicSnapshot,
    filter: &AppointmentFilter,
) -> Result<Document, ExportError> {
    let mut csv = CsvBuilder::new(&[
        "ID",
        "Patient",
        "Téléphone Patient",
        "Praticien",
        "Spécialité",
        "Date",
        "Heure",
        "Statut",
        "Parent",
    ]);
    for a in filter_appointments(snapshot, filter) {
        let patient = snapshot.patient_by_cin(&a.patient_cin);
        let practitioner = snapshot.practitioner(&a.practitioner_cin);
        csv.row(&[
            a.id.to_string(),
            patient.map_or_else(|| UNKNOWN_PERSON.into(), |p| p.full_name()),
            patient.and_then(|p| p.phone.clone()).unwrap_or_default(),
            practitioner.map_or_else(|| UNKNOWN_PERSON.into(), |p| p.full_name()),
            practitioner.and_then(|p| p.specialty.clone()).unwrap_or_default(),
            format_date(&a.scheduled_at.date()),
            a.scheduled_at.format("%H:%M").to_string(),
            status_label(a.status).to_string(),
            a.parent_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
        ]);
    }
    csv.finish("rendezvous.csv")
}

/// Prescriptions matching `filter`, joined to their consultation.
pub fn prescriptions_csv(
    snapshot: &ClinicSnapshot,
    filter: &PrescriptionFilter,
) -> Result<Document, ExportError> {
    let mut csv = CsvBuilder::new(&[
        "ID",
        "Consultation ID",
        "Patient",
        "Praticien",
        "Compte rendu",
        "Date consultation",
        "Type",
        "Posologie",
        "Date prescription",
    ]);
    for rx in filter_prescriptions(snapshot, filter) {
        let consultation = snapshot.consultations.iter().find(|c| c.id == rx.consultation_id);
        let visit = consultation.and_then(|c| snapshot.visit_of_consultation(c));
        csv.row(&[
            rx.id.to_string(),
            rx.consultation_id.to_string(),
            visit.as_ref().map_or_else(|| UNKNOWN_PERSON.into(), |v| v.patient_name()),
            visit.as_ref().map_or_else(|| UNKNOWN_PERSON.into(), |v| v.practitioner_name()),
            consultation.map(|c| c.report.clone()).unwrap_or_default(),
            consultation
                .map(|c| format_date(&c.consulted_at.date()))
                .unwrap_or_default(),
            rx.treatment.clone(),
            rx.dosage.clone(),
            rx.prescribed_on.map(|d| format_date(&d)).unwrap_or_default(),
        ]);
    }
    csv.finish("prescriptions.csv")
}

/// Consultations matching `filter`, oldest first.
pub fn consultations_csv(
    snapshot: &ClinicSnapshot,
    filter: &ConsultationFilter,
) -> Result<Document, ExportError> {
    let mut csv = CsvBuilder::new(&[
        "ID Consultation",
        "Patient",
        "Praticien",
        "Date Consultation",
        "Prix",
        "Compte Rendu",
    ]);
    for c in filter_consultations(snapshot, filter) {
        let visit = snapshot.visit_of_consultation(c);
        csv.row(&[
            c.id.to_string(),
            visit.as_ref().map_or_else(|| UNKNOWN_PERSON.into(), |v| v.patient_name()),
            visit.as_ref().map_or_else(|| UNKNOWN_PERSON.into(), |v| v.practitioner_name()),
            format_datetime(&c.consulted_at),
            c.price.map_or_else(|| "Gratuit".to_string(), format_amount),
            c.report.clone(),
        ]);
    }
    csv.finish("consultations.csv")
}
