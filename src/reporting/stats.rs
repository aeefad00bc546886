use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::read_model::{ClinicSnapshot, VisitView};
use crate::models::enums::{AppointmentStatus, Sex};
use crate::models::timefmt;
use crate::models::{Exam, Patient, Prescription};

/// Two-decimal display of an amount.
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn same_month(day: NaiveDate, today: NaiveDate) -> bool {
    day.year() == today.year() && day.month() == today.month()
}

// ─── Dashboard ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    pub en_attente: usize,
    pub confirme: usize,
    pub annule: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patients: usize,
    pub total_consultations: usize,
    pub total_praticiens: usize,
    pub consultations_ce_mois: usize,
    pub patients_hommes: usize,
    pub patients_femmes: usize,
    pub rendez_vous_par_statut: StatusCounts,
    pub rendez_vous_aujourdhui: usize,
}

pub fn dashboard(snapshot: &ClinicSnapshot, today: NaiveDate) -> DashboardStats {
    let count_sex = |sex: Sex| snapshot.patients.iter().filter(|p| p.sex == Some(sex)).count();

    let mut by_status = StatusCounts::default();
    for appointment in &snapshot.appointments {
        match appointment.status {
            AppointmentStatus::Pending => by_status.en_attente += 1,
            AppointmentStatus::Confirmed => by_status.confirme += 1,
            AppointmentStatus::Cancelled => by_status.annule += 1,
        }
    }

    DashboardStats {
        total_patients: snapshot.patients.len(),
        total_consultations: snapshot.consultations.len(),
        total_praticiens: snapshot.practitioners.len(),
        consultations_ce_mois: snapshot
            .consultations
            .iter()
            .filter(|c| same_month(c.consulted_at.date(), today))
            .count(),
        patients_hommes: count_sex(Sex::Male),
        patients_femmes: count_sex(Sex::Female),
        rendez_vous_par_statut: by_status,
        rendez_vous_aujourdhui: snapshot
            .appointments
            .iter()
            .filter(|a| a.scheduled_at.date() == today)
            .count(),
    }
}

// ─── Consultations ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationStats {
    pub total: usize,
    /// Consultations with a non-zero price.
    pub avec_prix: usize,
    pub total_revenue: f64,
    /// Mean over priced consultations only; zero when none are priced.
    pub moyenne_prix: f64,
    pub consultations_ce_mois: usize,
    /// Consultations billed nothing.
    pub gratuit: usize,
}

pub fn consultation_stats(snapshot: &ClinicSnapshot, today: NaiveDate) -> ConsultationStats {
    let consultations = &snapshot.consultations;
    let total = consultations.len();
    let avec_prix = consultations.iter().filter(|c| c.billed() != 0.0).count();
    let total_revenue = consultations.iter().fold(0.0, |acc, c| acc + c.billed());
    let moyenne_prix = if avec_prix > 0 {
        total_revenue / avec_prix as f64
    } else {
        0.0
    };

    ConsultationStats {
        total,
        avec_prix,
        total_revenue: round_to(total_revenue, 2),
        moyenne_prix: round_to(moyenne_prix, 2),
        consultations_ce_mois: consultations
            .iter()
            .filter(|c| same_month(c.consulted_at.date(), today))
            .count(),
        gratuit: total - avec_prix,
    }
}

// ─── Prescriptions ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionStats {
    pub total: usize,
    pub this_month: usize,
    pub types_count: BTreeMap<String, usize>,
    /// Highest count wins; ties go to the alphabetically first treatment.
    pub most_common_type: Option<String>,
    pub types: usize,
}

pub fn prescription_stats(snapshot: &ClinicSnapshot, today: NaiveDate) -> PrescriptionStats {
    let mut types_count: BTreeMap<String, usize> = BTreeMap::new();
    for prescription in &snapshot.prescriptions {
        *types_count.entry(prescription.treatment.clone()).or_default() += 1;
    }

    let mut most_common: Option<(&String, usize)> = None;
    for (treatment, &count) in &types_count {
        if most_common.map_or(true, |(_, best)| count > best) {
            most_common = Some((treatment, count));
        }
    }
    let most_common_type = most_common.map(|(t, _)| t.clone());

    PrescriptionStats {
        total: snapshot.prescriptions.len(),
        this_month: snapshot
            .prescriptions
            .iter()
            .filter(|p| p.prescribed_on.is_some_and(|d| same_month(d, today)))
            .count(),
        types: types_count.len(),
        types_count,
        most_common_type,
    }
}

// ─── Billing ──────────────────────────────────────────────────────────────────

/// Per-patient billing row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientBilling {
    pub id_patient: i64,
    pub cin_patient: Option<String>,
    pub nom: String,
    pub prenom: String,
    pub telephone: Option<String>,
    pub email: Option<String>,
    /// Sum of consultation prices, an unset price counting as zero.
    pub total: f64,
    pub total_affiche: String,
    pub nombre_consultations: usize,
    #[serde(with = "timefmt::option_datetime")]
    pub derniere_consultation: Option<NaiveDateTime>,
}

/// One appointment line of a patient statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementLine {
    pub id_rdv: i64,
    #[serde(with = "timefmt::datetime")]
    pub date_heure: NaiveDateTime,
    pub statut: AppointmentStatus,
    pub praticien: String,
    pub specialite: Option<String>,
    pub id_consult: Option<i64>,
    pub prix: f64,
    pub compte_rendu: Option<String>,
    pub prescriptions: Vec<Prescription>,
    pub examens: Vec<Exam>,
}

/// Billing row plus the visit lines behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientStatement {
    #[serde(flatten)]
    pub billing: PatientBilling,
    #[serde(rename = "lignes")]
    pub lines: Vec<StatementLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingOverview {
    pub total_patients: usize,
    pub total_revenue: f64,
    /// All consultations over all patients, one decimal.
    pub consultations_moyennes: f64,
    /// Full name of the patient with the most consultations; absent when
    /// nobody has any. Ties go to the first patient listed.
    pub patient_plus_actif: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingReport {
    pub overview: BillingOverview,
    pub patients: Vec<PatientBilling>,
}

fn billing_from_visits(patient: &Patient, visits: &[VisitView<'_>]) -> PatientBilling {
    let consulted: Vec<_> = visits.iter().filter_map(|v| v.consultation).collect();
    let total = consulted.iter().fold(0.0, |acc, c| acc + c.billed());
    PatientBilling {
        id_patient: patient.id,
        cin_patient: patient.national_id.clone(),
        nom: patient.last_name.clone(),
        prenom: patient.first_name.clone(),
        telephone: patient.phone.clone(),
        email: patient.email.clone(),
        total: round_to(total, 2),
        total_affiche: format_amount(total),
        nombre_consultations: consulted.len(),
        derniere_consultation: consulted.iter().map(|c| c.consulted_at).max(),
    }
}

pub fn patient_billing(snapshot: &ClinicSnapshot, patient: &Patient) -> PatientBilling {
    billing_from_visits(patient, &snapshot.visits_of(patient))
}

pub fn patient_statement(snapshot: &ClinicSnapshot, patient: &Patient) -> PatientStatement {
    let visits = snapshot.visits_of(patient);
    let lines = visits
        .iter()
        .map(|v| StatementLine {
            id_rdv: v.appointment.id,
            date_heure: v.appointment.scheduled_at,
            statut: v.appointment.status,
            praticien: v.practitioner_name(),
            specialite: v.practitioner.and_then(|p| p.specialty.clone()),
            id_consult: v.consultation.map(|c| c.id),
            prix: v.billed(),
            compte_rendu: v
                .consultation
                .map(|c| c.report.clone())
                .filter(|r| !r.is_empty()),
            prescriptions: v.prescriptions.iter().map(|&p| p.clone()).collect(),
            examens: v.exams.iter().map(|&e| e.clone()).collect(),
        })
        .collect();
    PatientStatement {
        billing: billing_from_visits(patient, &visits),
        lines,
    }
}

pub fn billing_report(snapshot: &ClinicSnapshot) -> BillingReport {
    let patients: Vec<PatientBilling> = snapshot
        .patients
        .iter()
        .map(|p| patient_billing(snapshot, p))
        .collect();

    let total_patients = patients.len();
    let total_revenue = patients.iter().fold(0.0, |acc, p| acc + p.total);
    let consultations_moyennes = if total_patients > 0 {
        round_to(snapshot.consultations.len() as f64 / total_patients as f64, 1)
    } else {
        0.0
    };

    let mut most_active: Option<&PatientBilling> = None;
    for row in &patients {
        let best = most_active.map_or(0, |m| m.nombre_consultations);
        if row.nombre_consultations > best {
            most_active = Some(row);
        }
    }

    BillingReport {
        overview: BillingOverview {
            total_patients,
            total_revenue: round_to(total_revenue, 2),
            consultations_moyennes,
            patient_plus_actif: most_active.map(|m| format!("{} {}", m.prenom, m.nom)),
        },
        patients,
    }
}
