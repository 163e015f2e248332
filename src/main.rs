use bank_ledger::application::auth::{Authenticator, TokenIssuer};
use bank_ledger::application::bank::Bank;
use bank_ledger::config::{Cli, Command, IssueCardArgs, PostArgs, RegisterArgs, ServeArgs};
use bank_ledger::domain::account::AccountNumber;
use bank_ledger::domain::ports::{CardStore, LedgerStore, SystemClock, UserStore};
use bank_ledger::domain::user::NewUser;
use bank_ledger::infrastructure::in_memory::InMemoryStore;
#[cfg(feature = "storage-rocksdb")]
use bank_ledger::infrastructure::rocksdb::RocksDBStore;
use bank_ledger::interfaces::csv::account_writer::AccountWriter;
use bank_ledger::interfaces::csv::transaction_reader::TransactionReader;
use bank_ledger::interfaces::http::{AppState, router};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bank_ledger=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => {
            // Use persistent storage (RocksDB)
            let store = RocksDBStore::open(db_path).into_diagnostic()?;
            run(store, cli.command).await
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            run(InMemoryStore::new(), cli.command).await
        }
        None => run(InMemoryStore::new(), cli.command).await,
    }
}

async fn run<S>(store: S, command: Command) -> Result<()>
where
    S: UserStore + LedgerStore + CardStore + Clone + 'static,
{
    match command {
        Command::Serve(args) => serve(store, args).await,
        Command::Register(args) => register(Bank::new(store, SystemClock), args).await,
        Command::IssueCard(args) => issue_card(Bank::new(store, SystemClock), args).await,
        Command::Post(args) => post(Bank::new(store, SystemClock), args).await,
    }
}

async fn serve<S>(store: S, args: ServeArgs) -> Result<()>
where
    S: UserStore + LedgerStore + CardStore + Clone + 'static,
{
    let tokens = TokenIssuer::new(&args.tokens, Box::new(SystemClock));
    let auth = Authenticator::new(Box::new(store.clone()), tokens);
    let app = router(AppState::new(Bank::new(store, SystemClock), auth));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .into_diagnostic()?;
    info!(address = %args.bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    info!("Server stopped");
    Ok(())
}

async fn register(bank: Bank, args: RegisterArgs) -> Result<()> {
    let (user, account) = bank
        .register(NewUser {
            phone_number: args.phone,
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            address: args.address,
            dob: None,
            password: args.password,
        })
        .await
        .into_diagnostic()?;
    println!(
        "Registered user {} ({}) with account {}",
        user.id, user.username, account.number
    );
    Ok(())
}

async fn issue_card(bank: Bank, args: IssueCardArgs) -> Result<()> {
    let user = bank.find_by_phone(&args.phone).await.into_diagnostic()?;
    let card = bank.issue_card(&user.id).await.into_diagnostic()?;
    println!(
        "Issued card {} to user {} (expires {})",
        card.card_number, user.id, card.expiry_date
    );
    Ok(())
}

async fn post(bank: Bank, args: PostArgs) -> Result<()> {
    let file = File::open(args.input).into_diagnostic()?;
    let reader = TransactionReader::new(file);

    let mut touched: BTreeSet<AccountNumber> = BTreeSet::new();
    for request in reader.requests() {
        match request {
            Ok(request) => match bank.post(request).await {
                Ok(tx) => {
                    touched.insert(tx.account);
                    touched.extend(tx.to_account);
                }
                Err(e) => {
                    eprintln!("Error processing transaction: {}", e);
                }
            },
            Err(e) => {
                eprintln!("Error reading transaction: {}", e);
            }
        }
    }

    let mut accounts = Vec::with_capacity(touched.len());
    for number in &touched {
        accounts.push(bank.account(number).await.into_diagnostic()?);
    }

    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(accounts).into_diagnostic()?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
