//! Console reports
//!
//! Every renderer writes line-oriented text to a `Write` and returns a
//! `RenderError` instead of panicking. An empty input always produces an
//! explicit notice rather than an empty table.

use crate::aggregate::{
    self, Boundary, DaySummary, DuplicateAnalysis, GroupCounts, GroupOrder, Percentage,
};
use crate::record::{AttendanceRecord, Status, NOT_AVAILABLE, NO_REGION};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Weekday};
use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

const MONTHS: [&str; 12] = [
    "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto", "Setembro",
    "Outubro", "Novembro", "Dezembro",
];

/// `dd/mm/yyyy HH:MM:SS`
pub fn format_datetime(ts: &DateTime<FixedOffset>) -> String {
    ts.format("%d/%m/%Y %H:%M:%S").to_string()
}

/// `HH:MM:SS`
pub fn format_time(ts: &DateTime<FixedOffset>) -> String {
    ts.format("%H:%M:%S").to_string()
}

/// `17 de Agosto de 2025`
pub fn format_long_date(date: NaiveDate) -> String {
    let month = MONTHS
        .get(date.month0() as usize)
        .copied()
        .unwrap_or_default();
    format!("{} de {} de {}", date.day(), month, date.year())
}

fn weekday_abbrev(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "seg.",
        Weekday::Tue => "ter.",
        Weekday::Wed => "qua.",
        Weekday::Thu => "qui.",
        Weekday::Fri => "sex.",
        Weekday::Sat => "sáb.",
        Weekday::Sun => "dom.",
    }
}

fn timestamp_or_na(ts: Option<&DateTime<FixedOffset>>, format: &str) -> String {
    ts.map(|t| t.format(format).to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn banner(out: &mut dyn Write, title: &str) -> Result<()> {
    writeln!(out, "📅 {}", "=".repeat(50))?;
    writeln!(out, "{}", title)?;
    writeln!(out, "📅 {}", "=".repeat(50))?;
    writeln!(out)?;
    Ok(())
}

pub fn render_collections(out: &mut dyn Write, names: &[String]) -> Result<()> {
    writeln!(out, "📚 COLEÇÕES DISPONÍVEIS:")?;
    if names.is_empty() {
        writeln!(out, "  ⚠️  Nenhuma coleção encontrada")?;
    }
    for name in names {
        writeln!(out, "  - {}", name)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Newest-first listing produced by `list-latest`
pub fn render_latest(out: &mut dyn Write, limit: i64, records: &[AttendanceRecord]) -> Result<()> {
    writeln!(out, "👥 ÚLTIMOS {} REGISTROS DE PRESENÇA:", limit.max(0))?;

    for record in records {
        writeln!(out)?;
        writeln!(out, "  📋 ID: {}", record.id)?;
        writeln!(out, "     Nome: {}", record.full_name)?;
        writeln!(out, "     CPF: {}", record.cpf)?;
        writeln!(out, "     Status: {}", record.status)?;
        writeln!(out, "     Região: {}", record.region_or(NOT_AVAILABLE))?;
        writeln!(
            out,
            "     Data: {}",
            timestamp_or_na(record.timestamp.as_ref(), "%d/%m/%Y %H:%M:%S")
        )?;
        if let Some(reason) = record.displayed_reason() {
            writeln!(out, "     Justificativa: {}", reason)?;
        }
    }

    if records.is_empty() {
        writeln!(out, "  ⚠️  Nenhum registro encontrado")?;
    }

    writeln!(out)?;
    writeln!(out, "  📊 Total exibido: {} registros", records.len())?;
    Ok(())
}

fn render_groups(out: &mut dyn Write, counts: &GroupCounts, total: usize) -> Result<()> {
    for Percentage { key, count, percent } in aggregate::percentages(counts, total) {
        writeln!(out, "     {}: {} ({:.1}%)", key, count, percent)?;
    }
    Ok(())
}

fn render_leader(out: &mut dyn Write, counts: &GroupCounts) -> Result<()> {
    if let Some((key, count)) = counts.most_common() {
        writeln!(out, "     🏆 Mais frequente: {} ({})", key, count)?;
    }
    Ok(())
}

/// Collection-wide statistics, keys in alphabetical order
pub fn render_stats(out: &mut dyn Write, records: &[AttendanceRecord]) -> Result<()> {
    writeln!(out, "📊 ESTATÍSTICAS DOS REGISTROS:")?;
    writeln!(out)?;
    writeln!(out, "  📈 Total de registros: {}", records.len())?;

    if records.is_empty() {
        writeln!(out, "  ⚠️  Nenhum registro encontrado")?;
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "  📊 Por Status:")?;
    let statuses = aggregate::by_status(records, GroupOrder::Alphabetical);
    render_groups(out, &statuses, records.len())?;
    render_leader(out, &statuses)?;

    writeln!(out)?;
    writeln!(out, "  🌍 Por Região:")?;
    let regions = aggregate::by_region(records, NO_REGION, GroupOrder::Alphabetical);
    render_groups(out, &regions, records.len())?;
    render_leader(out, &regions)?;
    Ok(())
}

/// Records carrying one status, newest first
pub fn render_by_status(
    out: &mut dyn Write,
    status: &Status,
    records: &[AttendanceRecord],
) -> Result<()> {
    writeln!(out, "🔍 REGISTROS COM STATUS: {}", status)?;

    for record in records {
        writeln!(
            out,
            "  • {} ({}) - {}",
            record.full_name,
            record.region_or(NOT_AVAILABLE),
            timestamp_or_na(record.timestamp.as_ref(), "%d/%m/%Y")
        )?;
        if let Some(reason) = record.displayed_reason() {
            writeln!(out, "    Motivo: {}", reason)?;
        }
    }

    if records.is_empty() {
        writeln!(out, "  ⚠️  Nenhum registro encontrado com status '{}'", status)?;
    } else {
        writeln!(out)?;
        writeln!(out, "  📊 Total encontrado: {} registros", records.len())?;
    }
    Ok(())
}

/// Everything the single-day report shows, computed up front
#[derive(Debug, Clone)]
pub struct DayReport {
    pub date: NaiveDate,
    pub zone: FixedOffset,
    /// Oldest first
    pub records: Vec<AttendanceRecord>,
    pub status_counts: GroupCounts,
    pub region_counts: GroupCounts,
    pub boundary: Option<Boundary>,
}

impl DayReport {
    pub fn build(date: NaiveDate, zone: FixedOffset, records: Vec<AttendanceRecord>) -> Self {
        let status_counts = aggregate::by_status(&records, GroupOrder::FirstSeen);
        let region_counts = aggregate::by_region(&records, NOT_AVAILABLE, GroupOrder::FirstSeen);
        let boundary = aggregate::boundary_timestamps(&records);
        Self {
            date,
            zone,
            records,
            status_counts,
            region_counts,
            boundary,
        }
    }

    pub fn percentages(&self) -> Vec<Percentage> {
        aggregate::percentages(&self.status_counts, self.records.len())
    }
}

pub fn render_day_report(out: &mut dyn Write, report: &DayReport) -> Result<()> {
    let short_date = report.date.format("%d/%m/%Y");
    banner(
        out,
        &format!(
            "📊 RELATÓRIO DO DIA {}",
            format_long_date(report.date).to_uppercase()
        ),
    )?;

    let range = crate::query::DayRange::day(report.date, report.zone);
    writeln!(out, "🔍 Buscando registros entre:")?;
    writeln!(out, "   📅 Início: {}", range.start.format("%d/%m/%Y %H:%M:%S %:z"))?;
    writeln!(out, "   📅 Fim: {}", range.end.format("%d/%m/%Y %H:%M:%S %:z"))?;
    writeln!(out)?;

    if report.records.is_empty() {
        writeln!(out, "⚠️  NENHUM REGISTRO ENCONTRADO PARA O DIA {}", short_date)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "📈 TOTAL DE REGISTROS: {}", report.records.len())?;
    writeln!(out)?;

    writeln!(out, "📊 DISTRIBUIÇÃO POR STATUS:")?;
    for (status, count) in report.status_counts.iter() {
        writeln!(
            out,
            "   {} {}: {} pessoa(s)",
            Status::marker_for(status),
            status,
            count
        )?;
    }
    writeln!(out)?;

    writeln!(out, "🌍 DISTRIBUIÇÃO POR REGIÃO:")?;
    for (region, count) in report.region_counts.iter() {
        writeln!(out, "   📍 {}: {} pessoa(s)", region, count)?;
    }
    writeln!(out)?;

    writeln!(out, "👥 LISTA DETALHADA DOS REGISTROS:")?;
    writeln!(out, "{}", "=".repeat(60))?;
    for (i, record) in report.records.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "{:2}. {} {}", i + 1, record.status.marker(), record.full_name)?;
        writeln!(out, "    📄 CPF: {}", record.cpf)?;
        writeln!(
            out,
            "    🏢 Cargo: {}",
            record.church_position.as_deref().unwrap_or(NOT_AVAILABLE)
        )?;
        writeln!(out, "    📍 Região: {}", record.region_or(NOT_AVAILABLE))?;
        writeln!(
            out,
            "    👨‍🏫 Pastor: {}",
            record.pastor_name.as_deref().unwrap_or(NOT_AVAILABLE)
        )?;
        writeln!(
            out,
            "    ⏰ Horário: {}",
            timestamp_or_na(record.timestamp.as_ref(), "%H:%M:%S")
        )?;
        if let Some(reason) = record.displayed_reason() {
            writeln!(out, "    📝 Justificativa: {}", reason)?;
        }
        writeln!(out, "    {}", "─".repeat(40))?;
    }

    writeln!(out)?;
    writeln!(out, "📋 RESUMO FINAL:")?;
    writeln!(out, "   📅 Data: {}", format_long_date(report.date))?;
    writeln!(out, "   📊 Total de Registros: {}", report.records.len())?;
    if let Some(boundary) = &report.boundary {
        writeln!(out, "   ⏰ Primeiro Registro: {}", format_time(&boundary.first))?;
        writeln!(out, "   ⏰ Último Registro: {}", format_time(&boundary.last))?;
    }
    for Percentage { key, count, percent } in report.percentages() {
        writeln!(out, "   📈 {}: {} ({:.1}%)", key, count, percent)?;
    }
    writeln!(out)?;
    writeln!(out, "✅ RELATÓRIO CONCLUÍDO COM SUCESSO!")?;
    Ok(())
}

pub fn render_duplicates(out: &mut dyn Write, analysis: &DuplicateAnalysis) -> Result<()> {
    writeln!(out, "🔍 ANÁLISE DE DUPLICATAS POR CPF")?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "   • CPFs únicos: {}", analysis.unique_cpfs)?;
    writeln!(out, "   • CPFs com duplicatas: {}", analysis.groups.len())?;
    writeln!(
        out,
        "   • Total de registros duplicados: {}",
        analysis.duplicated_records()
    )?;

    if analysis.groups.is_empty() {
        writeln!(out)?;
        writeln!(out, "✅ Nenhuma duplicata encontrada")?;
        return Ok(());
    }

    for group in &analysis.groups {
        writeln!(out)?;
        writeln!(out, "• CPF: {} ({} registros)", group.cpf, group.records.len())?;
        for (i, record) in group.records.iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, record.full_name)?;
            writeln!(out, "     - ID: {}", record.id)?;
            writeln!(
                out,
                "     - Data: {}",
                timestamp_or_na(record.timestamp.as_ref(), "%d/%m/%Y %H:%M:%S")
            )?;
            writeln!(out, "     - Status: {}", record.status)?;
            writeln!(out, "     - Região: {}", record.region_or(NOT_AVAILABLE))?;
        }
        if group.same_name {
            writeln!(out, "   ⚠️ PROVÁVEL DUPLICATA REAL (mesmo nome)")?;
        } else {
            writeln!(
                out,
                "   ⚠️ POSSÍVEL CPF COMPARTILHADO (nomes diferentes: {})",
                group.names().join(", ")
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "📊 RESUMO:")?;
    writeln!(out, "   • Duplicatas reais (mesmo nome): {}", analysis.real_duplicates())?;
    writeln!(
        out,
        "   • CPFs compartilhados (nomes diferentes): {}",
        analysis.shared_cpfs()
    )?;
    Ok(())
}

pub fn render_daily_summary(out: &mut dyn Write, days: &[DaySummary]) -> Result<()> {
    writeln!(out, "📊 SÍNTESE DOS ÚLTIMOS {} DIAS:", days.len())?;
    writeln!(out, "{}", "─".repeat(60))?;

    if days.iter().all(|d| d.total == 0) {
        writeln!(out, "   ⚠️  Nenhum registro encontrado no período")?;
    }

    for day in days {
        writeln!(
            out,
            "   {} {}: {} total, {} presentes, {} justificados ({:.1}%)",
            weekday_abbrev(day.date.weekday()),
            day.date.format("%d/%m"),
            day.total,
            day.presente,
            day.justificado,
            day.presence_rate()
        )?;
    }
    Ok(())
}
