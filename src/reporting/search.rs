//! In-memory filters over a loaded snapshot.
//!
//! Each filter gives the same rows, in the same order, as the matching
//! SQL search in `db::repository`.

use super::read_model::ClinicSnapshot;
use crate::models::*;
use crate::text::{matches_text, non_blank};

fn any_patient_matches(snapshot: &ClinicSnapshot, cin: &str, needle: &str) -> bool {
    snapshot
        .patients_with_cin(cin)
        .any(|p| matches_text(&p.full_name(), needle))
}

fn practitioner_matches(snapshot: &ClinicSnapshot, cin: &str, needle: &str) -> bool {
    snapshot
        .practitioner(cin)
        .is_some_and(|p| matches_text(&p.full_name(), needle))
}

pub fn filter_patients<'a>(snapshot: &'a ClinicSnapshot, filter: &PatientFilter) -> Vec<&'a Patient> {
    let nom = non_blank(&filter.nom);
    let prenom = non_blank(&filter.prenom);
    let cin = non_blank(&filter.cin);

    snapshot
        .patients
        .iter()
        .filter(|p| nom.map_or(true, |n| matches_text(&p.last_name, n)))
        .filter(|p| prenom.map_or(true, |n| matches_text(&p.first_name, n)))
        .filter(|p| {
            cin.map_or(true, |c| {
                p.national_id.as_deref().is_some_and(|id| matches_text(id, c))
            })
        })
        .filter(|p| filter.sexe.map_or(true, |s| p.sex == Some(s)))
        .collect()
}

pub fn filter_appointments<'a>(
    snapshot: &'a ClinicSnapshot,
    filter: &AppointmentFilter,
) -> Vec<&'a Appointment> {
    let patient_cin = non_blank(&filter.patient_cin);
    let practitioner_cin = non_blank(&filter.practitioner_cin);
    let q = non_blank(&filter.q);

    let mut rows: Vec<&Appointment> = snapshot
        .appointments
        .iter()
        .filter(|a| filter.statut.map_or(true, |s| a.status == s))
        .filter(|a| patient_cin.map_or(true, |c| a.patient_cin == c))
        .filter(|a| practitioner_cin.map_or(true, |c| a.practitioner_cin == c))
        .filter(|a| within_days(a.scheduled_at.date(), filter.from, filter.to))
        .filter(|a| {
            q.map_or(true, |q| {
                any_patient_matches(snapshot, &a.patient_cin, q)
                    || practitioner_matches(snapshot, &a.practitioner_cin, q)
            })
        })
        .collect();
    rows.sort_by_key(|a| (a.scheduled_at, a.id));
    rows
}

pub fn filter_consultations<'a>(
    snapshot: &'a ClinicSnapshot,
    filter: &ConsultationFilter,
) -> Vec<&'a Consultation> {
    let patient = non_blank(&filter.patient);
    let practitioner = non_blank(&filter.praticien);
    let report = non_blank(&filter.compte_rendu);

    let mut rows: Vec<&Consultation> = snapshot
        .consultations
        .iter()
        .filter(|c| {
            let appointment = snapshot.appointment(c.appointment_id);
            let patient_ok = patient.map_or(true, |n| {
                appointment.is_some_and(|a| {
                    snapshot
                        .patients_with_cin(&a.patient_cin)
                        .any(|p| matches_text(&p.last_name, n) || matches_text(&p.first_name, n))
                })
            });
            let practitioner_ok = practitioner.map_or(true, |n| {
                appointment
                    .and_then(|a| snapshot.practitioner(&a.practitioner_cin))
                    .is_some_and(|p| matches_text(&p.last_name, n) || matches_text(&p.first_name, n))
            });
            patient_ok && practitioner_ok
        })
        .filter(|c| filter.date.map_or(true, |d| c.consulted_at.date() == d))
        .filter(|c| report.map_or(true, |r| matches_text(&c.report, r)))
        .filter(|c| filter.price_min.map_or(true, |min| c.billed() >= min))
        .filter(|c| filter.price_max.map_or(true, |max| c.billed() <= max))
        .collect();
    rows.sort_by_key(|c| (c.consulted_at, c.id));
    rows
}

pub fn filter_prescriptions<'a>(
    snapshot: &'a ClinicSnapshot,
    filter: &PrescriptionFilter,
) -> Vec<&'a Prescription> {
    let q = non_blank(&filter.q);
    let bounded = filter.from.is_some() || filter.to.is_some();

    snapshot
        .prescriptions
        .iter()
        .filter(|rx| match rx.prescribed_on {
            Some(day) => within_days(day, filter.from, filter.to),
            None => !bounded,
        })
        .filter(|rx| {
            q.map_or(true, |q| {
                if matches_text(&rx.treatment, q) || matches_text(&rx.dosage, q) {
                    return true;
                }
                let appointment = snapshot
                    .consultations
                    .iter()
                    .find(|c| c.id == rx.consultation_id)
                    .and_then(|c| snapshot.appointment(c.appointment_id));
                appointment.is_some_and(|a| {
                    any_patient_matches(snapshot, &a.patient_cin, q)
                        || practitioner_matches(snapshot, &a.practitioner_cin, q)
                })
            })
        })
        .collect()
}
