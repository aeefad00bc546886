//! PDF documents via `printpdf`: patient list, patient invoice and the
//! daily consultations report.

use std::io::BufWriter;

use chrono::NaiveDate;
use printpdf::*;

use super::read_model::ClinicSnapshot;
use super::search::filter_patients;
use super::stats::{format_amount, patient_statement};
use super::{Document, ExportError, CURRENCY};
use crate::models::timefmt::format_date;
use crate::models::{Patient, PatientFilter};

const CLINIC_NAME: &str = "CABINET MÉDICAL ANDRANOMADIO";
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TOP: f32 = 277.0;
const BOTTOM: f32 = 20.0;
const LEFT: f32 = 20.0;

fn render_error(err: impl std::fmt::Display) -> ExportError {
    ExportError::Render(err.to_string())
}

/// Writes lines top to bottom, starting a new page when the current one
/// is full.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(render_error)?;
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: TOP,
            pages: 1,
        })
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height >= BOTTOM {
            return;
        }
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            format!("Page {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP;
    }

    /// One row of cells at fixed x offsets, then advance.
    fn row(&mut self, cells: &[(f32, &str)], size: f32, bold: bool) {
        let advance = size * 0.5;
        self.ensure_room(advance);
        let font = if bold { &self.bold } else { &self.regular };
        for (x, text) in cells {
            self.layer.use_text(*text, size, Mm(*x), Mm(self.y), font);
        }
        self.y -= advance;
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        self.row(&[(LEFT, text)], size, bold);
    }

    fn wrapped(&mut self, text: &str, size: f32, x: f32, max_chars: usize) {
        for line in wrap_text(text, max_chars) {
            self.row(&[(x, line.as_str())], size, false);
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn header(&mut self, title: &str) {
        self.line(CLINIC_NAME, 10.0, true);
        self.gap(2.0);
        self.line(title, 14.0, true);
        self.gap(4.0);
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc.save(&mut buf).map_err(render_error)?;
        buf.into_inner().map_err(render_error)
    }
}

/// Cut a cell to `max` characters so columns do not overlap.
fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + word.chars().count() + 1 > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn money(amount: f64) -> String {
    format!("{} {CURRENCY}", format_amount(amount))
}

// ─── Patient list ─────────────────────────────────────────────────────────────

/// Patients matching `filter`.
pub fn patients_pdf(
    snapshot: &ClinicSnapshot,
    filter: &PatientFilter,
    issued: NaiveDate,
) -> Result<Document, ExportError> {
    let patients = filter_patients(snapshot, filter);
    if patients.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    let mut page = PageWriter::new("Liste des patients")?;
    page.header("LISTE DES PATIENTS");
    page.line(
        &format!("Édité le {} ({} patients)", format_date(&issued), patients.len()),
        9.0,
        false,
    );
    page.gap(3.0);

    let columns = [LEFT, 32.0, 52.0, 87.0, 117.0, 135.0, 147.0];
    let header = ["ID", "CIN", "Nom", "Prénom", "Sexe", "Âge", "Téléphone"];
    page.row(&columns.iter().copied().zip(header).collect::<Vec<_>>(), 9.0, true);

    for p in patients {
        let cells = [
            p.id.to_string(),
            clip(p.national_id.as_deref().unwrap_or("-"), 10),
            clip(&p.last_name.to_uppercase(), 18),
            clip(&p.first_name, 16),
            p.sex.map_or("-", |s| s.as_str()).to_string(),
            p.age.to_string(),
            clip(p.phone.as_deref().unwrap_or("-"), 18),
        ];
        let row: Vec<(f32, &str)> = columns.iter().copied().zip(cells.iter().map(String::as_str)).collect();
        page.row(&row, 8.5, false);
    }

    Ok(Document::pdf("patients.pdf", page.finish()?))
}

// ─── Invoice ──────────────────────────────────────────────────────────────────

pub fn invoice_pdf(
    snapshot: &ClinicSnapshot,
    patient: &Patient,
    issued: NaiveDate,
) -> Result<Document, ExportError> {
    let statement = patient_statement(snapshot, patient);
    if statement.lines.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let mut page = PageWriter::new("Relevé de facturation")?;
    page.header("RELEVÉ DE FACTURATION PATIENT");

    let not_set = "Non renseigné";
    for (label, value) in [
        ("Patient", patient.full_name()),
        ("CIN", patient.national_id.clone().unwrap_or_else(|| not_set.into())),
        ("Téléphone", patient.phone.clone().unwrap_or_else(|| not_set.into())),
        ("Email", patient.email.clone().unwrap_or_else(|| not_set.into())),
        ("Date d'émission", format_date(&issued)),
    ] {
        page.line(&format!("{label} : {value}"), 9.5, false);
    }
    page.gap(4.0);

    let columns = [LEFT, 45.0, 62.0, 112.0, 160.0];
    page.row(
        &columns.iter().copied().zip(["Date", "Heure", "Praticien", "Spécialité", "Montant"]).collect::<Vec<_>>(),
        9.0,
        true,
    );
    for line in &statement.lines {
        let cells = [
            line.date_heure.format("%d/%m/%Y").to_string(),
            line.date_heure.format("%H:%M").to_string(),
            clip(&line.praticien, 26),
            clip(line.specialite.as_deref().unwrap_or("-"), 24),
            money(line.prix),
        ];
        let row: Vec<(f32, &str)> = columns.iter().copied().zip(cells.iter().map(String::as_str)).collect();
        page.row(&row, 8.5, false);
    }
    page.gap(2.0);
    let total = money(statement.billing.total);
    page.row(&[(112.0, "TOTAL"), (160.0, total.as_str())], 10.0, true);

    page.gap(6.0);
    page.line("DÉTAIL DES CONSULTATIONS", 11.0, true);
    for line in statement.lines.iter().filter(|l| l.id_consult.is_some()) {
        page.gap(2.0);
        page.line(
            &format!("{} - {}", line.date_heure.format("%d/%m/%Y %H:%M"), line.praticien),
            9.5,
            true,
        );
        let report = line.compte_rendu.as_deref().unwrap_or("Pas de compte-rendu");
        page.wrapped(&format!("Compte rendu : {report}"), 8.5, 25.0, 95);
        for rx in &line.prescriptions {
            page.wrapped(&format!("Prescription : {} ({})", rx.treatment, rx.dosage), 8.5, 25.0, 95);
        }
        for exam in &line.examens {
            let result = exam.result.as_deref().unwrap_or("en attente");
            page.wrapped(
                &format!("Examen : {} le {} - {result}", exam.exam_type, format_date(&exam.exam_date)),
                8.5,
                25.0,
                95,
            );
        }
    }

    let cin = patient.national_id.as_deref().unwrap_or("patient");
    Ok(Document::pdf(format!("facture_{cin}.pdf"), page.finish()?))
}

// ─── Daily report ─────────────────────────────────────────────────────────────

/// Consultations held on `day`, in time order.
pub fn daily_consultations_pdf(
    snapshot: &ClinicSnapshot,
    day: NaiveDate,
) -> Result<Document, ExportError> {
    let mut consultations: Vec<_> = snapshot
        .consultations
        .iter()
        .filter(|c| c.consulted_at.date() == day)
        .collect();
    if consultations.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    consultations.sort_by_key(|c| (c.consulted_at, c.id));

    let mut page = PageWriter::new("Rapport des consultations")?;
    page.header(&format!("CONSULTATIONS DU {}", day.format("%d/%m/%Y")));

    let columns = [LEFT, 38.0, 88.0, 138.0];
    page.row(
        &columns.iter().copied().zip(["Heure", "Patient", "Praticien", "Prix"]).collect::<Vec<_>>(),
        9.0,
        true,
    );
    let mut total = 0.0;
    for consultation in &consultations {
        let visit = snapshot.visit_of_consultation(consultation);
        let price = match consultation.price {
            Some(p) => money(p),
            None => "Gratuit".to_string(),
        };
        total += consultation.billed();
        let cells = [
            consultation.consulted_at.format("%H:%M").to_string(),
            clip(&visit.as_ref().map_or_else(|| super::UNKNOWN_PERSON.into(), |v| v.patient_name()), 28),
            clip(&visit.as_ref().map_or_else(|| super::UNKNOWN_PERSON.into(), |v| v.practitioner_name()), 28),
            price,
        ];
        let row: Vec<(f32, &str)> = columns.iter().copied().zip(cells.iter().map(String::as_str)).collect();
        page.row(&row, 8.5, false);
        if !consultation.report.is_empty() {
            page.wrapped(&consultation.report, 8.0, 38.0, 85);
        }
    }
    page.gap(2.0);
    let count = format!("{} consultation(s)", consultations.len());
    let total = money(total);
    page.row(&[(LEFT, count.as_str()), (138.0, total.as_str())], 10.0, true);

    Ok(Document::pdf(
        format!("consultations_{}.pdf", format_date(&day)),
        page.finish()?,
    ))
}
