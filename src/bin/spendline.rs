//! CLI for managing transactions and budgets through a spendline ledger.

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use spendline::aggregate::{self, BudgetStatus, BudgetSummary, SpendingSource};
use spendline::backend::{BlockingBackend, FileBackend};
use spendline::config::{LedgerConfig, API_URL_ENV, TOKEN_ENV};
use spendline::currency::{CurrencyFormatter, CurrencyOption};
use spendline::error::LedgerError;
use spendline::ledger::{LedgerBlocking, TransactionOutcome};
use spendline::linking::LinkOutcome;
use spendline::models::{
    BudgetDraft, BudgetEdit, BudgetId, BudgetNotifications, BudgetPeriod, Category, Decimal,
    NaiveDate, Transaction, TransactionDraft, TransactionEdit, TransactionFilter, TransactionId,
    TransactionType,
};

/// Keep transactions and category budgets consistent.
#[derive(Debug, Parser)]
#[command(name = "spendline", version, about)]
struct Cli {
    /// Work on a local JSON ledger instead of the HTTP API.
    #[arg(long, global = true)]
    local: bool,
    /// Directory of the local ledger (implies --local; default: XDG data dir).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// List, add, edit or delete transactions.
    #[command(subcommand)]
    Transactions(TransactionCommand),
    /// List, add, edit, delete or refresh budgets.
    #[command(subcommand)]
    Budgets(BudgetCommand),
    /// Show the category vocabulary.
    Categories {
        /// Only show categories of this type (income or expense).
        #[arg(long, value_parser = parse_kind)]
        kind: Option<TransactionType>,
    },
    /// Show the built-in currency presets.
    Currencies,
}

/// `transactions` subcommands.
#[derive(Debug, Subcommand)]
enum TransactionCommand {
    /// List transactions, newest first.
    List(ListArgs),
    /// Record a new transaction.
    Add(AddTransactionArgs),
    /// Change an existing transaction.
    Edit(EditTransactionArgs),
    /// Delete a transaction.
    Delete {
        /// Transaction ID.
        id: String,
    },
}

/// `budgets` subcommands.
#[derive(Debug, Subcommand)]
enum BudgetCommand {
    /// List budgets with their spending.
    List {
        /// Only show budgets of this period (weekly, monthly, yearly).
        #[arg(long, value_parser = parse_period)]
        period: Option<BudgetPeriod>,
    },
    /// Create a budget for an expense category.
    Add(AddBudgetArgs),
    /// Change an existing budget.
    Edit(EditBudgetArgs),
    /// Delete a budget; its transactions are kept but unlinked.
    Delete {
        /// Budget ID.
        id: String,
    },
    /// Re-aggregate the spending of every budget.
    Refresh {
        /// Ask the server to recompute spending instead.
        #[arg(long)]
        server: bool,
    },
}

/// Arguments for `transactions list`.
#[derive(Debug, Default, Args)]
struct ListArgs {
    /// Start date (inclusive, YYYY-MM-DD). Requires --to.
    #[arg(long, requires = "to", value_parser = parse_date)]
    from: Option<NaiveDate>,
    /// End date (inclusive, YYYY-MM-DD). Requires --from.
    #[arg(long, requires = "from", value_parser = parse_date)]
    to: Option<NaiveDate>,
    /// Category name, e.g. "Food & Dining".
    #[arg(long)]
    category: Option<String>,
    /// Transaction type (income or expense).
    #[arg(long, value_parser = parse_kind)]
    kind: Option<TransactionType>,
    /// Only transactions linked to this budget ID.
    #[arg(long)]
    budget: Option<String>,
    /// Case-insensitive description search.
    #[arg(long)]
    search: Option<String>,
}

/// Arguments for `transactions add`.
#[derive(Debug, Args)]
struct AddTransactionArgs {
    /// Transaction type (income or expense).
    #[arg(long, default_value = "expense", value_parser = parse_kind)]
    kind: TransactionType,
    /// Amount, greater than zero.
    #[arg(long, value_parser = parse_amount)]
    amount: Decimal,
    /// Category name from the vocabulary of the type.
    #[arg(long)]
    category: String,
    /// Short description.
    #[arg(long)]
    description: String,
    /// Date (YYYY-MM-DD, default: today).
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    /// Payment method label.
    #[arg(long)]
    payment_method: Option<String>,
    /// Mark as recurring.
    #[arg(long)]
    recurring: bool,
}

/// Arguments for `transactions edit`.
#[derive(Debug, Args)]
struct EditTransactionArgs {
    /// Transaction ID.
    id: String,
    /// New amount.
    #[arg(long, value_parser = parse_amount)]
    amount: Option<Decimal>,
    /// New category; re-links the transaction to a matching budget.
    #[arg(long)]
    category: Option<String>,
    /// New description.
    #[arg(long)]
    description: Option<String>,
    /// New payment method (empty to clear).
    #[arg(long)]
    payment_method: Option<String>,
    /// New recurring flag (true or false).
    #[arg(long)]
    recurring: Option<bool>,
}

/// Arguments for `budgets add`.
#[derive(Debug, Args)]
struct AddBudgetArgs {
    /// Expense category name.
    #[arg(long)]
    category: String,
    /// Spending ceiling, greater than zero.
    #[arg(long, value_parser = parse_amount)]
    amount: Decimal,
    /// Period label (weekly, monthly, yearly).
    #[arg(long, default_value = "monthly", value_parser = parse_period)]
    period: BudgetPeriod,
    /// First day (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    start: NaiveDate,
    /// Last day (YYYY-MM-DD), after the first.
    #[arg(long, value_parser = parse_date)]
    end: NaiveDate,
    /// Near-limit alert threshold in percent.
    #[arg(long, default_value_t = spendline::models::DEFAULT_THRESHOLD)]
    threshold: u8,
    /// Disable near-limit alerts.
    #[arg(long)]
    no_alerts: bool,
}

/// Arguments for `budgets edit`.
#[derive(Debug, Args)]
struct EditBudgetArgs {
    /// Budget ID.
    id: String,
    /// New ceiling.
    #[arg(long, value_parser = parse_amount)]
    amount: Option<Decimal>,
    /// New first day (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,
    /// New last day (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,
}

/// Parses a date string in `YYYY-MM-DD` format for clap.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|err| format!("{err}"))
}

/// Parses a decimal amount for clap.
fn parse_amount(s: &str) -> Result<Decimal, String> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|err| format!("invalid amount '{s}': {err}"))
}

/// Parses a transaction type for clap.
fn parse_kind(s: &str) -> Result<TransactionType, String> {
    s.parse()
}

/// Parses a budget period for clap.
fn parse_period(s: &str) -> Result<BudgetPeriod, String> {
    s.parse()
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match LedgerConfig::from_env() {
        Ok(config) => config,
        Err(err) => return report("invalid configuration", &err),
    };
    let formatter = CurrencyFormatter::new(config.currency.clone());

    match cli.command {
        Command::Categories { kind } => return print_categories(kind),
        Command::Currencies => return print_currencies(),
        Command::Transactions(_) | Command::Budgets(_) => {}
    }

    if cli.local || cli.data_dir.is_some() {
        match open_local(cli.data_dir) {
            Ok(backend) => with_ledger(backend, &formatter, cli.command),
            Err(err) => report("failed to open local ledger", &err),
        }
    } else {
        match config.blocking_client() {
            Ok(client) => with_ledger(client, &formatter, cli.command),
            Err(err) => {
                let code = report("failed to build API client", &err)?;
                writeln!(
                    io::stderr().lock(),
                    "  {} set {} and {} (a .env file works), or pass {}",
                    "hint:".cyan(),
                    API_URL_ENV,
                    TOKEN_ENV,
                    "--local".bold()
                )?;
                Ok(code)
            }
        }
    }
}

/// Opens the file backend in `data_dir`, or the default directory.
fn open_local(data_dir: Option<PathBuf>) -> spendline::error::Result<FileBackend> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => FileBackend::default_dir()?,
    };
    FileBackend::new(dir)
}

/// Wraps `backend` in a ledger and runs `command` against it.
fn with_ledger<B: BlockingBackend>(
    backend: B,
    formatter: &CurrencyFormatter,
    command: Command,
) -> io::Result<ExitCode> {
    match LedgerBlocking::builder().backend(backend).build() {
        Ok(ledger) => dispatch(&ledger, formatter, command),
        Err(err) => report("failed to build ledger", &err),
    }
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch<B: BlockingBackend>(
    ledger: &LedgerBlocking<B>,
    formatter: &CurrencyFormatter,
    command: Command,
) -> io::Result<ExitCode> {
    match command {
        Command::Transactions(TransactionCommand::List(args)) => {
            cmd_list_transactions(ledger, formatter, &args)
        }
        Command::Transactions(TransactionCommand::Add(args)) => {
            cmd_add_transaction(ledger, formatter, &args)
        }
        Command::Transactions(TransactionCommand::Edit(args)) => {
            cmd_edit_transaction(ledger, formatter, &args)
        }
        Command::Transactions(TransactionCommand::Delete { id }) => {
            cmd_delete_transaction(ledger, &TransactionId::new(id))
        }
        Command::Budgets(BudgetCommand::List { period }) => {
            cmd_list_budgets(ledger, formatter, period)
        }
        Command::Budgets(BudgetCommand::Add(args)) => cmd_add_budget(ledger, formatter, &args),
        Command::Budgets(BudgetCommand::Edit(args)) => cmd_edit_budget(ledger, formatter, &args),
        Command::Budgets(BudgetCommand::Delete { id }) => {
            cmd_delete_budget(ledger, &BudgetId::new(id))
        }
        Command::Budgets(BudgetCommand::Refresh { server }) => {
            cmd_refresh(ledger, formatter, server)
        }
        Command::Categories { kind } => print_categories(kind),
        Command::Currencies => print_currencies(),
    }
}

/// Builds a [`TransactionFilter`] from CLI arguments.
fn build_filter(args: &ListArgs) -> Result<TransactionFilter, String> {
    let mut filter = TransactionFilter::new();
    if let Some((from_date, to_date)) = args.from.zip(args.to) {
        filter = filter.date_range(from_date, to_date);
    }
    if let Some(name) = args.category.as_deref() {
        let category =
            Category::from_name(name).ok_or_else(|| format!("unknown category: {name}"))?;
        filter = filter.category(category);
    }
    if let Some(kind) = args.kind {
        filter = filter.kind(kind);
    }
    if let Some(budget) = args.budget.as_deref() {
        filter = filter.linked_budget(BudgetId::from(budget));
    }
    if let Some(text) = args.search.as_deref() {
        filter = filter.search(text);
    }
    Ok(filter)
}

/// Builds a [`TransactionEdit`] from CLI arguments.
fn build_transaction_edit(args: &EditTransactionArgs) -> TransactionEdit {
    let mut edit = TransactionEdit::new();
    if let Some(amount) = args.amount {
        edit = edit.amount(amount);
    }
    if let Some(category) = args.category.as_deref() {
        edit = edit.category(category);
    }
    if let Some(description) = args.description.as_deref() {
        edit = edit.description(description);
    }
    if let Some(method) = args.payment_method.as_deref() {
        edit = edit.payment_method(method);
    }
    if let Some(recurring) = args.recurring {
        edit = edit.recurring(recurring);
    }
    edit
}

/// Builds a [`BudgetEdit`] from CLI arguments.
fn build_budget_edit(args: &EditBudgetArgs) -> BudgetEdit {
    let mut edit = BudgetEdit::new();
    if let Some(amount) = args.amount {
        edit = edit.amount(amount);
    }
    if let Some(start) = args.start {
        edit = edit.start_date(start);
    }
    if let Some(end) = args.end {
        edit = edit.end_date(end);
    }
    edit
}

/// Executes `transactions list`.
fn cmd_list_transactions<B: BlockingBackend>(
    ledger: &LedgerBlocking<B>,
    formatter: &CurrencyFormatter,
    args: &ListArgs,
) -> io::Result<ExitCode> {
    let filter = match build_filter(args) {
        Ok(filter) => filter,
        Err(message) => {
            writeln!(io::stderr().lock(), "{} {message}", "error:".red().bold())?;
            return Ok(ExitCode::FAILURE);
        }
    };
    let spinner = make_spinner("Loading transactions...");
    let result = ledger.list_transactions(&filter);
    spinner.finish_and_clear();
    match result {
        Ok(txs) => {
            print_transactions_table(&txs, formatter)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to list transactions", &err),
    }
}

/// Executes `transactions add`.
fn cmd_add_transaction<B: BlockingBackend>(
    ledger: &LedgerBlocking<B>,
    formatter: &CurrencyFormatter,
    args: &AddTransactionArgs,
) -> io::Result<ExitCode> {
    let mut draft = TransactionDraft::new(
        args.kind,
        args.amount,
        args.category.as_str(),
        args.description.as_str(),
        args.date.unwrap_or_else(|| ledger.today()),
    )
    .recurring(args.recurring);
    if let Some(method) = args.payment_method.as_deref() {
        draft = draft.payment_method(method);
    }
    match ledger.create_transaction(&draft) {
        Ok(outcome) => {
            print_transaction_outcome("Saved", &outcome, formatter)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to save transaction", &err),
    }
}

/// Executes `transactions edit`.
fn cmd_edit_transaction<B: BlockingBackend>(
    ledger: &LedgerBlocking<B>,
    formatter: &CurrencyFormatter,
    args: &EditTransactionArgs,
) -> io::Result<ExitCode> {
    let id = TransactionId::from(args.id.as_str());
    match ledger.update_transaction(&id, &build_transaction_edit(args)) {
        Ok(outcome) => {
            print_transaction_outcome("Updated", &outcome, formatter)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to update transaction", &err),
    }
}

/// Executes `transactions delete`.
fn cmd_delete_transaction<B: BlockingBackend>(
    ledger: &LedgerBlocking<B>,
    id: &TransactionId,
) -> io::Result<ExitCode> {
    match ledger.delete_transaction(id) {
        Ok(refreshed) => {
            let mut out = io::stdout().lock();
            writeln!(out, "{} transaction {}", "Deleted".green().bold(), id)?;
            if !refreshed {
                warn_not_refreshed(&mut out)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.is_not_found() => {
            writeln!(
                io::stdout().lock(),
                "{}",
                format_args!("Transaction {id} was already deleted.").dimmed()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to delete transaction", &err),
    }
}

/// Executes `budgets list`.
fn cmd_list_budgets<B: BlockingBackend>(
    ledger: &LedgerBlocking<B>,
    formatter: &CurrencyFormatter,
    period: Option<BudgetPeriod>,
) -> io::Result<ExitCode> {
    let spinner = make_spinner("Loading budgets...");
    let result = ledger.list_budgets(period);
    spinner.finish_and_clear();
    match result {
        Ok(summaries) => {
            print_budgets_table(&summaries, formatter)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to list budgets", &err),
    }
}

/// Executes `budgets add`.
fn cmd_add_budget<B: BlockingBackend>(
    ledger: &LedgerBlocking<B>,
    formatter: &CurrencyFormatter,
    args: &AddBudgetArgs,
) -> io::Result<ExitCode> {
    let draft = BudgetDraft::new(
        args.category.as_str(),
        args.amount,
        args.period,
        args.start,
        args.end,
    )
    .notifications(BudgetNotifications {
        enabled: !args.no_alerts,
        threshold: args.threshold,
    });
    match ledger.create_budget(&draft) {
        Ok(outcome) => {
            let mut out = io::stdout().lock();
            let budget = &outcome.budget;
            writeln!(
                out,
                "{} budget {} for {} ({} {}, {} to {})",
                "Created".green().bold(),
                budget.id,
                budget.category.bold(),
                formatter.format_amount(budget.amount),
                budget.period,
                budget.start_date,
                budget.end_date
            )?;
            writeln!(
                out,
                "  {}",
                "Existing transactions are not linked; only new ones count against it.".dimmed()
            )?;
            if !outcome.refreshed {
                warn_not_refreshed(&mut out)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to create budget", &err),
    }
}

/// Executes `budgets edit`.
fn cmd_edit_budget<B: BlockingBackend>(
    ledger: &LedgerBlocking<B>,
    formatter: &CurrencyFormatter,
    args: &EditBudgetArgs,
) -> io::Result<ExitCode> {
    let id = BudgetId::from(args.id.as_str());
    match ledger.update_budget(&id, &build_budget_edit(args)) {
        Ok(outcome) => {
            let mut out = io::stdout().lock();
            let budget = &outcome.budget;
            writeln!(
                out,
                "{} budget {} ({}, {} to {})",
                "Updated".green().bold(),
                budget.id,
                formatter.format_amount(budget.amount),
                budget.start_date,
                budget.end_date
            )?;
            if !outcome.refreshed {
                warn_not_refreshed(&mut out)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to update budget", &err),
    }
}

/// Executes `budgets delete`.
fn cmd_delete_budget<B: BlockingBackend>(
    ledger: &LedgerBlocking<B>,
    id: &BudgetId,
) -> io::Result<ExitCode> {
    let spinner = make_spinner("Deleting budget and unlinking transactions...");
    let result = ledger.delete_budget(id);
    spinner.finish_and_clear();
    match result {
        Ok(deletion) => {
            let mut out = io::stdout().lock();
            writeln!(
                out,
                "{} budget {} {}",
                "Deleted".green().bold(),
                id,
                format_args!("({} transactions unlinked)", deletion.unlinked_count()).dimmed()
            )?;
            if !deletion.refreshed {
                warn_not_refreshed(&mut out)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to delete budget", &err),
    }
}

/// Executes `budgets refresh`.
fn cmd_refresh<B: BlockingBackend>(
    ledger: &LedgerBlocking<B>,
    formatter: &CurrencyFormatter,
    server: bool,
) -> io::Result<ExitCode> {
    let spinner = make_spinner("Refreshing budget spending...");
    let result = if server {
        ledger.refresh_spending()
    } else {
        ledger.refresh_budgets()
    };
    spinner.finish_and_clear();
    match result {
        Ok(summaries) => {
            print_budgets_table(&summaries, formatter)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("budget refresh failed", &err),
    }
}

// ── Output formatting ────────────────────────────────────────────────

/// Prints an error with field details and hints; returns the failure code.
fn report(context: &str, err: &LedgerError) -> io::Result<ExitCode> {
    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{} {context}: {err}", "error:".red().bold())?;
    if let Some(fields) = err.validation() {
        for field in fields.fields() {
            writeln!(stderr, "  {} {}", field.field.bold(), field.message)?;
        }
    }
    if matches!(*err, LedgerError::AuthExpired) {
        writeln!(
            stderr,
            "  {} your session expired; update {} and try again",
            "hint:".cyan(),
            TOKEN_ENV
        )?;
    }
    if matches!(*err, LedgerError::DuplicateCategory { .. }) {
        writeln!(
            stderr,
            "  {} edit the existing budget with {}",
            "hint:".cyan(),
            "spendline budgets edit".bold()
        )?;
    }
    Ok(ExitCode::FAILURE)
}

/// Tells the user that budget totals may be stale.
fn warn_not_refreshed<W: io::Write>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "  {} budget spending could not be refreshed; run {}",
        "warning:".yellow().bold(),
        "spendline budgets refresh".bold()
    )
}

/// Prints the result of saving a transaction.
fn print_transaction_outcome(
    verb: &str,
    outcome: &TransactionOutcome,
    formatter: &CurrencyFormatter,
) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let tx = &outcome.transaction;
    writeln!(
        out,
        "{} {} {} ({}, {})",
        verb.green().bold(),
        tx.kind,
        tx.id,
        formatter.format_amount(tx.amount),
        tx.category
    )?;
    if let Some(budget) = outcome.link.as_ref().and_then(LinkOutcome::budget_id) {
        writeln!(out, "  counts against budget {}", budget.bold())?;
    }
    if let Some(LinkOutcome::NoBudget { category }) = outcome.link {
        writeln!(
            out,
            "  {} no budget covers {} on {}; create one with {}",
            "note:".cyan(),
            category.bold(),
            tx.date,
            "spendline budgets add".bold()
        )?;
    }
    if !outcome.refreshed {
        warn_not_refreshed(&mut out)?;
    }
    Ok(())
}

/// Prints transactions in a table.
fn print_transactions_table(txs: &[Transaction], formatter: &CurrencyFormatter) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if txs.is_empty() {
        writeln!(out, "{}", "No transactions found.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Date").fg(Color::Cyan),
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("Description").fg(Color::Cyan),
        Cell::new("Amount").fg(Color::Cyan),
        Cell::new("Budget").fg(Color::Cyan),
        Cell::new("ID").fg(Color::Cyan),
    ]);

    for tx in txs {
        let amount = formatter.format_amount(tx.amount);
        let amount_cell = match tx.kind {
            TransactionType::Expense => Cell::new(format!("-{amount}")).fg(Color::Red),
            TransactionType::Income => Cell::new(format!("+{amount}")).fg(Color::Green),
        };
        let budget_cell = tx.linked_budget_id.as_ref().map_or_else(
            || Cell::new("\u{2014}").fg(Color::DarkGrey),
            Cell::new,
        );
        _ = table.add_row(vec![
            Cell::new(tx.date),
            Cell::new(tx.category),
            Cell::new(&tx.description),
            amount_cell,
            budget_cell,
            Cell::new(&tx.id).fg(Color::DarkGrey),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Transactions".green().bold(),
        format_args!("({})", txs.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints budget summaries in a table, followed by totals.
fn print_budgets_table(
    summaries: &[BudgetSummary],
    formatter: &CurrencyFormatter,
) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if summaries.is_empty() {
        writeln!(out, "{}", "No budgets found.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("Period").fg(Color::Cyan),
        Cell::new("Window").fg(Color::Cyan),
        Cell::new("Budget").fg(Color::Cyan),
        Cell::new("Spent").fg(Color::Cyan),
        Cell::new("Remaining").fg(Color::Cyan),
        Cell::new("Used").fg(Color::Cyan),
        Cell::new("ID").fg(Color::Cyan),
    ]);

    for summary in summaries {
        let budget = &summary.budget;
        let status_color = match summary.status() {
            BudgetStatus::OverBudget => Color::Red,
            BudgetStatus::NearLimit => Color::Yellow,
            BudgetStatus::OnTrack => Color::Green,
        };
        let spent = match summary.source {
            SpendingSource::Cached => {
                format!("{} (cached)", formatter.format_amount(summary.current_spending))
            }
            SpendingSource::Server | SpendingSource::Client => {
                formatter.format_amount(summary.current_spending)
            }
        };
        _ = table.add_row(vec![
            Cell::new(budget.category),
            Cell::new(budget.period),
            Cell::new(format!("{} to {}", budget.start_date, budget.end_date)),
            Cell::new(formatter.format_amount(budget.amount)),
            Cell::new(spent),
            Cell::new(formatter.format_amount(summary.remaining_amount())).fg(status_color),
            Cell::new(formatter.format_percentage(summary.utilization_percentage()))
                .fg(status_color),
            Cell::new(&budget.id).fg(Color::DarkGrey),
        ]);
    }

    let totals = aggregate::totals(summaries);
    writeln!(
        out,
        "{} {}",
        "Budgets".green().bold(),
        format_args!("({})", summaries.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    writeln!(
        out,
        "{} {} allocated, {} spent, {} remaining",
        "Total:".bold(),
        formatter.format_amount(totals.allocated),
        formatter.format_amount(totals.spent),
        formatter.format_amount(totals.remaining)
    )?;
    if totals.over_budget > 0 {
        writeln!(
            out,
            "{}",
            format_args!("{} budget(s) over their limit", totals.over_budget)
                .red()
                .bold()
        )?;
    }
    Ok(())
}

/// Prints the category vocabulary.
fn print_categories(kind: Option<TransactionType>) -> io::Result<ExitCode> {
    let kinds: &[TransactionType] = match kind {
        Some(TransactionType::Expense) => &[TransactionType::Expense],
        Some(TransactionType::Income) => &[TransactionType::Income],
        None => &[TransactionType::Expense, TransactionType::Income],
    };

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Type").fg(Color::Cyan),
        Cell::new("Icon").fg(Color::Cyan),
        Cell::new("Color").fg(Color::Cyan),
    ]);
    for &vocabulary in kinds {
        for category in Category::vocabulary(vocabulary) {
            let info = category.info();
            _ = table.add_row(vec![
                Cell::new(info.name),
                Cell::new(vocabulary),
                Cell::new(info.icon),
                Cell::new(info.color),
            ]);
        }
    }

    let mut out = io::stdout().lock();
    writeln!(out, "{}", "Categories".green().bold())?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the built-in currency presets with a formatting sample.
fn print_currencies() -> io::Result<ExitCode> {
    let sample = Decimal::new(1_234_567, 2);
    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Code").fg(Color::Cyan),
        Cell::new("Symbol").fg(Color::Cyan),
        Cell::new("Decimals").fg(Color::Cyan),
        Cell::new("Sample").fg(Color::Cyan),
    ]);
    for preset in CurrencyOption::presets() {
        let formatted = CurrencyFormatter::new(preset.clone()).format_amount(sample);
        _ = table.add_row(vec![
            Cell::new(&preset.code),
            Cell::new(&preset.symbol),
            Cell::new(preset.decimal_places),
            Cell::new(formatted),
        ]);
    }

    let mut out = io::stdout().lock();
    writeln!(out, "{}", "Currencies".green().bold())?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(ExitCode::SUCCESS)
}

/// Creates a spinner with the given message.
fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(core::time::Duration::from_millis(80));
    spinner
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}
