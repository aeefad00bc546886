use std::collections::HashMap;

use rusqlite::Connection;

use crate::db::repository as repo;
use crate::db::DatabaseError;
use crate::models::*;

/// Label used when a natural id resolves to nobody.
pub const UNKNOWN_PERSON: &str = "Inconnu";

/// Every table loaded once, with the lookups the reports need.
///
/// People are joined by natural id: an appointment's `patient_cin` may
/// match several patients, or none. Where a single patient is needed the
/// one with the lowest surrogate id is used.
#[derive(Debug, Default)]
pub struct ClinicSnapshot {
    pub patients: Vec<Patient>,
    pub practitioners: Vec<Practitioner>,
    pub appointments: Vec<Appointment>,
    pub consultations: Vec<Consultation>,
    pub prescriptions: Vec<Prescription>,
    pub exams: Vec<Exam>,
    practitioner_index: HashMap<String, usize>,
    appointment_index: HashMap<i64, usize>,
    consultation_by_appointment: HashMap<i64, usize>,
}

impl ClinicSnapshot {
    pub fn load(conn: &Connection) -> Result<Self, DatabaseError> {
        Ok(Self::from_parts(
            repo::list_patients(conn, &PatientFilter::default())?,
            repo::list_practitioners(conn)?,
            repo::list_appointments(conn, &AppointmentFilter::default())?,
            repo::list_consultations(conn)?,
            repo::list_prescriptions(conn, &PrescriptionFilter::default())?,
            repo::list_exams(conn)?,
        ))
    }

    pub fn from_parts(
        patients: Vec<Patient>,
        practitioners: Vec<Practitioner>,
        appointments: Vec<Appointment>,
        consultations: Vec<Consultation>,
        prescriptions: Vec<Prescription>,
        exams: Vec<Exam>,
    ) -> Self {
        let practitioner_index = practitioners
            .iter()
            .enumerate()
            .map(|(i, p)| (p.national_id.clone(), i))
            .collect();
        let appointment_index = appointments.iter().enumerate().map(|(i, a)| (a.id, i)).collect();
        let consultation_by_appointment = consultations
            .iter()
            .enumerate()
            .map(|(i, c)| (c.appointment_id, i))
            .collect();
        Self {
            patients,
            practitioners,
            appointments,
            consultations,
            prescriptions,
            exams,
            practitioner_index,
            appointment_index,
            consultation_by_appointment,
        }
    }

    pub fn patient(&self, id: i64) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    /// Every patient carrying this national id.
    pub fn patients_with_cin<'a, 'b>(&'a self, cin: &'b str) -> impl Iterator<Item = &'a Patient> + 'b
    where
        'a: 'b,
    {
        self.patients
            .iter()
            .filter(move |p| p.national_id.as_deref() == Some(cin))
    }

    pub fn patient_by_cin(&self, cin: &str) -> Option<&Patient> {
        self.patients_with_cin(cin).min_by_key(|p| p.id)
    }

    pub fn practitioner(&self, cin: &str) -> Option<&Practitioner> {
        self.practitioner_index.get(cin).map(|&i| &self.practitioners[i])
    }

    pub fn appointment(&self, id: i64) -> Option<&Appointment> {
        self.appointment_index.get(&id).map(|&i| &self.appointments[i])
    }

    pub fn consultation_for(&self, appointment_id: i64) -> Option<&Consultation> {
        self.consultation_by_appointment
            .get(&appointment_id)
            .map(|&i| &self.consultations[i])
    }

    fn visit<'a>(&'a self, appointment: &'a Appointment) -> VisitView<'a> {
        let consultation = self.consultation_for(appointment.id);
        let (prescriptions, exams) = match consultation {
            Some(c) => (
                self.prescriptions.iter().filter(|p| p.consultation_id == c.id).collect(),
                self.exams.iter().filter(|e| e.consultation_id == c.id).collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        VisitView {
            appointment,
            patient: self.patient_by_cin(&appointment.patient_cin),
            practitioner: self.practitioner(&appointment.practitioner_cin),
            consultation,
            prescriptions,
            exams,
        }
    }

    /// All appointments joined with their people and consultation.
    pub fn visits(&self) -> Vec<VisitView<'_>> {
        self.appointments.iter().map(|a| self.visit(a)).collect()
    }

    /// Appointments booked under this patient's national id, oldest first.
    /// A patient without a national id has none, and so does a patient
    /// whose id is shared by an older record: each visit is billed once.
    pub fn visits_of(&self, patient: &Patient) -> Vec<VisitView<'_>> {
        let Some(cin) = patient.national_id.as_deref() else {
            return Vec::new();
        };
        if self.patient_by_cin(cin).map(|owner| owner.id) != Some(patient.id) {
            return Vec::new();
        }
        let mut visits: Vec<_> = self
            .appointments
            .iter()
            .filter(|a| a.patient_cin == cin)
            .map(|a| self.visit(a))
            .collect();
        visits.sort_by_key(|v| (v.appointment.scheduled_at, v.appointment.id));
        visits
    }

    /// The visit a consultation belongs to.
    pub fn visit_of_consultation(&self, consultation: &Consultation) -> Option<VisitView<'_>> {
        self.appointment(consultation.appointment_id).map(|a| self.visit(a))
    }
}

/// One appointment with everything joined onto it.
#[derive(Debug, Clone)]
pub struct VisitView<'a> {
    pub appointment: &'a Appointment,
    pub patient: Option<&'a Patient>,
    pub practitioner: Option<&'a Practitioner>,
    pub consultation: Option<&'a Consultation>,
    pub prescriptions: Vec<&'a Prescription>,
    pub exams: Vec<&'a Exam>,
}

impl VisitView<'_> {
    pub fn patient_name(&self) -> String {
        self.patient
            .map(Patient::full_name)
            .unwrap_or_else(|| UNKNOWN_PERSON.to_string())
    }

    pub fn practitioner_name(&self) -> String {
        self.practitioner
            .map(Practitioner::full_name)
            .unwrap_or_else(|| UNKNOWN_PERSON.to_string())
    }

    /// Amount billed for this visit; no consultation or no price bills zero.
    pub fn billed(&self) -> f64 {
        self.consultation.map_or(0.0, Consultation::billed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::change_status;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::AppointmentStatus;

    #[test]
    fn visits_join_people_and_consultation() {
        let conn = open_memory_database().unwrap();
        let (patient_id, _) = fixtures::seed_pair(&conn);
        let rdv =
            repo::insert_appointment(&conn, &fixtures::appointment("A1", "P1", "2025-03-14T09:30"))
                .unwrap();
        change_status(&conn, rdv, AppointmentStatus::Confirmed).unwrap();

        let snapshot = ClinicSnapshot::load(&conn).unwrap();
        let patient = snapshot.patient(patient_id).unwrap();
        let visits = snapshot.visits_of(patient);
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].patient_name(), "Jean Dupont");
        assert_eq!(visits[0].practitioner_name(), "Luc Martin");
        assert!(visits[0].consultation.is_some());
        assert_eq!(visits[0].billed(), 0.0);
    }

    #[test]
    fn dangling_natural_ids_resolve_to_unknown() {
        let appointment = Appointment {
            id: 1,
            patient_cin: "ZZ".into(),
            practitioner_cin: "P404".into(),
            scheduled_at: crate::models::timefmt::parse_datetime("2025-01-01T08:00").unwrap(),
            status: AppointmentStatus::Pending,
            parent_id: None,
        };
        let snapshot = ClinicSnapshot::from_parts(
            vec![],
            vec![],
            vec![appointment],
            vec![],
            vec![],
            vec![],
        );
        let visits = snapshot.visits();
        assert_eq!(visits[0].patient_name(), UNKNOWN_PERSON);
        assert_eq!(visits[0].practitioner_name(), UNKNOWN_PERSON);
    }

    #[test]
    fn patient_without_cin_has_no_visits() {
        let conn = open_memory_database().unwrap();
        fixtures::seed_pair(&conn);
        let mut anonymous = fixtures::patient("X", "Sans", "Cin", None);
        anonymous.national_id = None;
        let id = repo::insert_patient(&conn, &anonymous).unwrap();
        repo::insert_appointment(&conn, &fixtures::appointment("A1", "P1", "2025-03-14T09:30"))
            .unwrap();

        let snapshot = ClinicSnapshot::load(&conn).unwrap();
        assert!(snapshot.visits_of(snapshot.patient(id).unwrap()).is_empty());
    }

    #[test]
    fn shared_cin_visits_belong_to_the_oldest_record() {
        let conn = open_memory_database().unwrap();
        let (first, _) = fixtures::seed_pair(&conn);
        let second = repo::insert_patient(&conn, &fixtures::patient("A1", "Dupond", "Hélène", None))
            .unwrap();
        repo::insert_appointment(&conn, &fixtures::appointment("A1", "P1", "2025-03-14T09:30"))
            .unwrap();

        let snapshot = ClinicSnapshot::load(&conn).unwrap();
        assert_eq!(snapshot.patients_with_cin("A1").count(), 2);
        assert_eq!(snapshot.patient_by_cin("A1").map(|p| p.id), Some(first));
        assert_eq!(snapshot.visits_of(snapshot.patient(first).unwrap()).len(), 1);
        assert!(snapshot.visits_of(snapshot.patient(second).unwrap()).is_empty());
    }
}
