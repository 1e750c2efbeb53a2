//! Interface de terminal do Kingdom — spinners e fichas coloridas.
//!
//! Usa `indicatif` para o spinner exibido durante chamadas remotas e
//! `console` para colorir atributos por faixa: excepcional em verde, bom em
//! azul, médio em amarelo e fraco em vermelho.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use kingdom::attributes::{tier, Attribute, Tier};
use kingdom::catalog::{Job, JobCatalog};
use kingdom::citizen::Citizen;
use kingdom::error::KingdomError;
use kingdom::roster::{Applied, MergeReport};

/// Spinner exibido enquanto uma chamada ao serviço de simulação está pendente.
pub struct RemoteCall {
    // Barra de progresso/spinner do indicatif.
    pb: ProgressBar,
    green: Style,
    red: Style,
}

impl RemoteCall {
    /// Inicia o spinner com a descrição da chamada.
    pub fn start(description: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(description.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
        }
    }

    /// Finaliza o spinner; sucesso em verde com checkmark, falha em vermelho com X.
    pub fn finish<T>(&self, result: &Result<T, KingdomError>, done: &str) {
        self.pb.finish_and_clear();
        match result {
            Ok(_) => println!("  {} {done}", self.green.apply_to("✓")),
            Err(err) => println!("  {} {err} ({})", self.red.apply_to("✗"), err.kind()),
        }
    }
}

// Cor de cada faixa de atributo.
fn tier_style(tier: Tier) -> Style {
    match tier {
        Tier::Exceptional => Style::new().green().bold(),
        Tier::Good => Style::new().blue(),
        Tier::Average => Style::new().yellow(),
        Tier::Poor => Style::new().red(),
    }
}

/// Nome do emprego do cidadão, ou "Unemployed".
pub fn job_label(citizen: &Citizen, catalog: &JobCatalog) -> String {
    match &citizen.job_id {
        Some(id) => catalog
            .get(id)
            .map(|job| job.name.clone())
            .unwrap_or_else(|| id.clone()),
        None => "Unemployed".to_string(),
    }
}

/// Imprime a ficha completa de um cidadão.
pub fn print_sheet(citizen: &Citizen, catalog: &JobCatalog) {
    let bold = Style::new().bold();
    let dim = Style::new().dim();

    println!();
    println!("{}  {}", bold.apply_to(citizen.full_name()), dim.apply_to(&citizen.id));
    println!("  Job     {}", job_label(citizen, catalog));
    println!("  Age     {}", citizen.age);
    println!("  Health  {}%", citizen.health);
    for attribute in Attribute::ALL {
        let value = citizen.attribute(attribute);
        let (score, grade) = if attribute.is_tiered() {
            let t = tier(i64::from(value));
            let style = tier_style(t);
            (style.apply_to(value.to_string()), style.apply_to(t.to_string()))
        } else {
            let style = Style::new().magenta();
            (style.apply_to(value.to_string()), style.apply_to(String::new()))
        };
        println!(
            "  {:<13} {:>4} {:<12} {}",
            attribute.label(),
            score,
            grade,
            dim.apply_to(attribute.description())
        );
    }
}

/// Lista empregos com seus requisitos mínimos.
pub fn print_jobs(jobs: &[Job]) {
    if jobs.is_empty() {
        println!("  {}", Style::new().yellow().apply_to("No compatible jobs"));
        return;
    }
    for job in jobs {
        println!(
            "  {:<12} {:<20} STR {:>2}  INT {:>2}  CHA {:>2}",
            job.id, job.name, job.min_strength, job.min_intelligence, job.min_charisma
        );
    }
}

/// Avisa quando o resultado aplicado pode estar desatualizado.
pub fn print_applied(applied: &Applied<Citizen>, catalog: &JobCatalog) {
    if applied.stale {
        println!(
            "  {} another request touched {} meanwhile; result may be stale",
            Style::new().yellow().apply_to("!"),
            applied.value.id
        );
    }
    print_sheet(&applied.value, catalog);
}

/// Resume a incorporação de um ciclo de jogo.
pub fn print_merge_report(report: &MergeReport) {
    let yellow = Style::new().yellow();
    let cycle = report
        .cycle
        .map(|c| format!("cycle {c}"))
        .unwrap_or_else(|| "cycle".to_string());
    println!(
        "  {} of {}: {} citizen(s) updated",
        cycle,
        report.civilization_id,
        report.updated.len()
    );
    if !report.overwritten.is_empty() {
        println!(
            "  {} local edits overwritten: {}",
            yellow.apply_to("!"),
            report.overwritten.join(", ")
        );
    }
    if !report.skipped.is_empty() {
        println!(
            "  {} skipped unknown or removed: {}",
            yellow.apply_to("!"),
            report.skipped.join(", ")
        );
    }
}
