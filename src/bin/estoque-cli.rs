// src/bin/estoque-cli.rs
//
// Linha de comando para a API de estoque.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

use estoque_api::{
    client::{ApiClient, MovementFilter},
    models::{inventory::MovementType, reports::ReportFormat},
};

#[derive(Parser)]
#[command(name = "estoque-cli", about = "Cliente de linha de comando do controle de estoque", version)]
struct Cli {
    /// Endereço do servidor
    #[arg(long, env = "ESTOQUE_API_URL", default_value = "http://127.0.0.1:5000", global = true)]
    url: String,

    /// Token de acesso (obtido com `login`)
    #[arg(long, env = "ESTOQUE_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Saída em JSON formatado
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Autentica e imprime o token
    Login {
        #[arg(long)]
        login: String,
        #[arg(long)]
        password: String,
    },
    /// Saldo atual por produto
    Saldos {
        #[arg(long)]
        search: Option<String>,
    },
    /// Lista de produtos
    Produtos {
        #[arg(long)]
        search: Option<String>,
    },
    /// Registra uma entrada
    Entrada {
        produto_id: i32,
        quantidade: i32,
        #[arg(long)]
        motivo: Option<String>,
    },
    /// Registra uma saída (motivo obrigatório)
    Saida {
        produto_id: i32,
        quantidade: i32,
        motivo: String,
    },
    /// Importa produtos de um CSV
    Importar { arquivo: PathBuf },
    /// Histórico de movimentações
    Movimentacoes {
        #[arg(long, value_enum)]
        tipo: Option<Tipo>,
    },
    /// Baixa um relatório
    Relatorio {
        #[arg(value_enum)]
        kind: Relatorio,
        #[arg(long, value_enum, default_value = "pdf")]
        formato: Formato,
        /// Data inicial (AAAA-MM-DD), só para movimentações
        #[arg(long)]
        inicio: Option<NaiveDate>,
        /// Data final (AAAA-MM-DD), só para movimentações
        #[arg(long)]
        fim: Option<NaiveDate>,
        #[arg(long, value_enum)]
        tipo: Option<Tipo>,
        /// Arquivo de destino
        #[arg(long, short)]
        saida: PathBuf,
    },
    /// Versão publicada pelo servidor
    Versao,
}

#[derive(Clone, Copy, ValueEnum)]
enum Tipo {
    Entrada,
    Saida,
}

impl From<Tipo> for MovementType {
    fn from(t: Tipo) -> Self {
        match t {
            Tipo::Entrada => MovementType::Entrada,
            Tipo::Saida => MovementType::Saida,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Relatorio {
    Inventario,
    Movimentacoes,
}

#[derive(Clone, Copy, ValueEnum)]
enum Formato {
    Pdf,
    Xlsx,
}

impl From<Formato> for ReportFormat {
    fn from(f: Formato) -> Self {
        match f {
            Formato::Pdf => ReportFormat::Pdf,
            Formato::Xlsx => ReportFormat::Xlsx,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut client = ApiClient::new(&cli.url, cli.token.clone())?;

    match cli.command {
        Commands::Login { login, password } => {
            let token = client.login(&login, &password).await?;
            if cli.json {
                print_json(&serde_json::json!({ "accessToken": token }))?;
            } else {
                println!("{}", token);
                eprintln!("Defina ESTOQUE_TOKEN com o valor acima para os próximos comandos.");
            }
        }
        Commands::Saldos { search } => {
            let balances = client.balances(search.as_deref()).await?;
            if cli.json {
                return print_json(&balances);
            }
            println!("{:>6}  {:<20}  {:<40}  {:>8}", "ID", "CÓDIGO", "NOME", "SALDO");
            for b in balances {
                println!("{:>6}  {:<20}  {:<40}  {:>8}", b.product_id, b.code, b.name, b.balance);
            }
        }
        Commands::Produtos { search } => {
            let products = client.list_products(search.as_deref()).await?;
            if cli.json {
                return print_json(&products);
            }
            for p in products {
                println!(
                    "{:>6}  {:<20}  {:<40}  R$ {:>10}  [{}] [{}]",
                    p.id,
                    p.code,
                    p.name,
                    p.price.to_string(),
                    p.suppliers,
                    p.categories
                );
            }
        }
        Commands::Entrada { produto_id, quantidade, motivo } => {
            let response = client.record_entry(produto_id, quantidade, motivo.as_deref()).await?;
            println!("{} Novo saldo: {}", response.message, response.new_balance);
        }
        Commands::Saida { produto_id, quantidade, motivo } => {
            let response = client.record_exit(produto_id, quantidade, &motivo).await?;
            println!("{} Novo saldo: {}", response.message, response.new_balance);
        }
        Commands::Importar { arquivo } => {
            let bytes = tokio::fs::read(&arquivo)
                .await
                .with_context(|| format!("Não foi possível ler {}", arquivo.display()))?;
            let filename = arquivo
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "importacao.csv".to_string());
            let summary = client.import_csv(&filename, bytes).await?;
            if cli.json {
                return print_json(&summary);
            }
            println!("{}", summary.message);
            for error in summary.errors {
                println!("  - {}", error);
            }
        }
        Commands::Movimentacoes { tipo } => {
            let history = client.movements(tipo.map(Into::into)).await?;
            if cli.json {
                return print_json(&history);
            }
            for m in history {
                println!(
                    "{}  {:<8}  {:>6}  {:<20}  {:<20}  {}",
                    m.created_at.format("%d/%m/%Y %H:%M"),
                    format!("{:?}", m.movement_type),
                    m.quantity,
                    m.product_code,
                    m.user_name,
                    m.reason.unwrap_or_default()
                );
            }
        }
        Commands::Relatorio { kind, formato, inicio, fim, tipo, saida } => {
            let bytes = match kind {
                Relatorio::Inventario => client.inventory_report(formato.into()).await?,
                Relatorio::Movimentacoes => {
                    let filter = MovementFilter {
                        data_inicio: inicio,
                        data_fim: fim,
                        tipo: tipo.map(Into::into),
                    };
                    client.movement_report_file(&filter, formato.into()).await?
                }
            };
            tokio::fs::write(&saida, &bytes)
                .await
                .with_context(|| format!("Não foi possível gravar {}", saida.display()))?;
            println!("Relatório salvo em {}", saida.display());
        }
        Commands::Versao => {
            let version = client.version().await?;
            let server = version.get("versao").and_then(|v| v.as_str()).unwrap_or("?");
            if cli.json {
                return print_json(&version);
            }
            println!("Servidor: {}  |  CLI: {}", server, env!("CARGO_PKG_VERSION"));
            if let Some(url) = version.get("url_download").and_then(|v| v.as_str()) {
                println!("Download: {}", url);
            }
        }
    }

    Ok(())
}
