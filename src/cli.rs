//! Interface de linha de comando do Kingdom baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] e flags globais
//! (--backend-url, --civilization, --roster, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use kingdom::backend::ParamValue;

/// Kingdom — motor de progressão e empregos dos cidadãos de um assentamento.
#[derive(Debug, Parser)]
#[command(name = "kingdom", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// URL base do serviço de simulação (sobrescreve `kingdom.toml` e o ambiente).
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// Civilização alvo; sobrescreve a gravada no arquivo de roster.
    #[arg(long, global = true)]
    pub civilization: Option<String>,

    /// Arquivo JSON com o catálogo de empregos e os cidadãos.
    #[arg(long, global = true, default_value = "roster.json")]
    pub roster: PathBuf,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Lista os empregos para os quais o cidadão se qualifica.
    Jobs {
        citizen_id: String,
    },

    /// Atribui um emprego a um cidadão.
    Assign {
        citizen_id: String,
        job_id: String,
    },

    /// Remove o emprego atual do cidadão.
    Unassign {
        citizen_id: String,
    },

    /// Remove o cidadão definitivamente.
    Dismiss {
        citizen_id: String,
    },

    /// Executa uma ação no serviço de simulação.
    Action {
        citizen_id: String,

        /// Nome da ação (opaco para o motor).
        action: String,

        /// Parâmetros no formato `chave=valor`; pode ser repetido.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, ParamValue)>,
    },

    /// Simula o crescimento de um cidadão.
    Grow {
        citizen_id: String,
    },

    /// Avança um ciclo de jogo e incorpora o resultado ao roster.
    Advance,

    /// Mostra o estado remoto da civilização.
    State,

    /// Cria um novo cidadão na civilização.
    Create {
        name: String,

        #[arg(long)]
        strength: Option<u32>,

        #[arg(long)]
        intelligence: Option<u32>,

        #[arg(long)]
        charisma: Option<u32>,
    },

    /// Mostra a ficha de um cidadão, ou de todos.
    Show {
        citizen_id: Option<String>,
    },
}

// Converte `chave=valor` em um parâmetro tipado.
fn parse_param(raw: &str) -> Result<(String, ParamValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("esperado chave=valor, recebido `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("chave vazia em `{raw}`"));
    }
    Ok((key.to_string(), ParamValue::parse(value)))
}
