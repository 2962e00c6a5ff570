//! Interface de linha de comando do quiosque baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, demo, config)
//! e flags globais (--config, --late-threshold, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Quiosque de presença: check-in e check-out de equipe com verificação facial.
#[derive(Debug, Parser)]
#[command(name = "kiosk", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./kiosk.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Sobrescreve o limite de atraso, em minutos.
    #[arg(long, global = true)]
    pub late_threshold: Option<i64>,

    /// Habilita logs de depuração.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Abre o terminal interativo contra a API de presença.
    Run,

    /// Executa uma demonstração roteirizada contra o serviço em memória.
    Demo,

    /// Mostra a configuração efetiva (com o token ocultado).
    Config,
}
