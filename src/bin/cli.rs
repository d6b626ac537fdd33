//! ShelfKV CLI
//!
//! Command-line front end for managing books, members and loans.

use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use shelfkv::config::WalSyncStrategy;
use shelfkv::dashboard::LoanView;
use shelfkv::{Book, Config, IssueRequest, Library, Member, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// ShelfKV CLI
#[derive(Parser, Debug)]
#[command(name = "shelfkv-cli")]
#[command(about = "Library circulation records: books, members and loans")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./shelfkv_data")]
    data_dir: String,

    /// Loan period in days
    #[arg(long, default_value = "14")]
    loan_days: u32,

    /// Allow issuing a book that already has an open loan
    #[arg(long)]
    allow_double_issue: bool,

    /// Require known books/members on issue and refuse deleting records with open loans
    #[arg(long)]
    strict: bool,

    /// fsync every N writes instead of every write
    #[arg(long)]
    sync_every: Option<usize>,

    /// Compact the log once it reaches this many bytes (0 disables)
    #[arg(long, default_value = "4194304")]
    compact_at: u64,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage books
    #[command(subcommand)]
    Book(BookCommand),

    /// Manage members
    #[command(subcommand)]
    Member(MemberCommand),

    /// Issue a book to a member
    Issue {
        /// Book id
        #[arg(short, long)]
        book: String,

        /// Member id
        #[arg(short, long)]
        member: String,

        /// Issue date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Record the loan as already returned on this date
        #[arg(long)]
        return_date: Option<NaiveDate>,
    },

    /// Return an issued book
    Return {
        /// Book id
        book: Option<String>,
    },

    /// List all transactions, newest first
    Loans,

    /// Dashboard counters
    Stats,

    /// Check book statuses against open loans and the log checksums
    Verify,

    /// Rewrite the log down to its live state
    Compact,
}

#[derive(Subcommand, Debug)]
enum BookCommand {
    /// Add a book under the next generated id
    Add(BookFields),

    /// Create or replace a book with an explicit id
    Save {
        /// Book id
        id: String,

        #[command(flatten)]
        fields: BookFields,
    },

    /// List books
    List {
        /// Only books that can be issued
        #[arg(long)]
        available: bool,
    },

    /// Delete a book
    Delete {
        /// Book id
        id: String,
    },
}

#[derive(ClapArgs, Debug)]
struct BookFields {
    #[arg(long)]
    title: String,

    #[arg(long)]
    author: String,

    #[arg(long)]
    isbn: String,
}

#[derive(Subcommand, Debug)]
enum MemberCommand {
    /// Register a member under the next generated id
    Add(MemberFields),

    /// Create or replace a member with an explicit id
    Save {
        /// Member id
        id: String,

        #[command(flatten)]
        fields: MemberFields,
    },

    /// List members
    List,

    /// Delete a member
    Delete {
        /// Member id
        id: String,
    },
}

#[derive(ClapArgs, Debug)]
struct MemberFields {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    phone: String,
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays parseable
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,shelfkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let sync_strategy = match args.sync_every {
        Some(count) => WalSyncStrategy::EveryNEntries { count },
        None => WalSyncStrategy::EveryWrite,
    };

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .wal_sync_strategy(sync_strategy)
        .compaction_threshold(args.compact_at)
        .loan_period_days(args.loan_days)
        .reject_double_issue(!args.allow_double_issue)
        .verify_references(args.strict)
        .guard_deletes(args.strict)
        .build();

    let library = match Library::open(config) {
        Ok(library) => library,
        Err(e) => {
            tracing::error!("Failed to open library: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = run(&library, args.command, args.json);
    let closed = library.close();

    match outcome.and(closed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_user_facing() => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(library: &Library, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Book(cmd) => run_book(library, cmd, json),
        Commands::Member(cmd) => run_member(library, cmd, json),

        Commands::Issue {
            book,
            member,
            date,
            return_date,
        } => {
            let mut request = IssueRequest::new(book, member, date.unwrap_or_else(|| library.today()));
            if let Some(returned) = return_date {
                request = request.returned_on(returned);
            }
            let transaction = library.issue(request)?;
            if json {
                print_json(&transaction)?;
            } else {
                println!(
                    "Issued {} to {} (transaction {}, due {})",
                    transaction.book_id,
                    transaction.member_id,
                    transaction.id,
                    format_date(transaction.due_date, "-"),
                );
            }
            Ok(())
        }

        Commands::Return { book } => {
            let transaction = library.return_book(book.as_deref().unwrap_or(""))?;
            if json {
                print_json(&transaction)?;
            } else {
                println!(
                    "Returned {} (transaction {})",
                    transaction.book_id, transaction.id
                );
            }
            Ok(())
        }

        Commands::Loans => {
            let rows = library.loan_history()?;
            if json {
                print_json(&rows)
            } else {
                print_loans(&rows);
                Ok(())
            }
        }

        Commands::Stats => {
            let stats = library.stats()?;
            if json {
                print_json(&stats)
            } else {
                println!("Total Books:     {}", stats.total_books);
                println!("Total Members:   {}", stats.total_members);
                println!("Books Issued:    {}", stats.books_issued);
                println!("Books Available: {}", stats.books_available);
                println!("Overdue Books:   {}", stats.overdue);
                Ok(())
            }
        }

        Commands::Verify => {
            let report = library.audit()?;
            let log = library.verify_store()?;

            if json {
                #[derive(Serialize)]
                struct VerifyOutput<'a> {
                    consistent: bool,
                    issued_without_loan: &'a [String],
                    available_with_loan: &'a [String],
                    multiple_open_loans: &'a [String],
                    dangling_loans: &'a [String],
                    log_entries: Option<u64>,
                    log_corrupted: Option<u64>,
                }
                return print_json(&VerifyOutput {
                    consistent: report.is_consistent(),
                    issued_without_loan: &report.issued_without_loan,
                    available_with_loan: &report.available_with_loan,
                    multiple_open_loans: &report.multiple_open_loans,
                    dangling_loans: &report.dangling_loans,
                    log_entries: log.as_ref().map(|r| r.entries_recovered),
                    log_corrupted: log.as_ref().map(|r| r.entries_corrupted),
                });
            }

            if let Some(log) = log {
                println!(
                    "Log: {} entries, {} corrupted, last LSN {}",
                    log.entries_recovered, log.entries_corrupted, log.last_lsn
                );
            }
            if report.is_consistent() {
                println!("Book statuses match open loans");
            }
            for id in &report.issued_without_loan {
                println!("Book {} is marked Issued but has no open loan", id);
            }
            for id in &report.available_with_loan {
                println!("Book {} is marked Available but has an open loan", id);
            }
            for id in &report.multiple_open_loans {
                println!("Book {} has more than one open loan", id);
            }
            for id in &report.dangling_loans {
                println!("Open transaction {} references a missing book", id);
            }
            Ok(())
        }

        Commands::Compact => {
            let result = library.compact()?;
            if json {
                print_json(&(result.entries_before, result.entries_after))
            } else {
                println!(
                    "Compacted log: {} -> {} entries",
                    result.entries_before, result.entries_after
                );
                Ok(())
            }
        }
    }
}

fn run_book(library: &Library, cmd: BookCommand, json: bool) -> Result<()> {
    match cmd {
        BookCommand::Add(fields) => {
            let book = library.add_book(&fields.title, &fields.author, &fields.isbn)?;
            if json {
                print_json(&book)
            } else {
                println!("Added book {}", book.id);
                Ok(())
            }
        }
        BookCommand::Save { id, fields } => {
            // Editing keeps the current status; circulation owns it
            let status = library.book(&id)?.map(|b| b.status).unwrap_or_default();
            let mut book = Book::new(id, fields.title, fields.author, fields.isbn);
            book.status = status;
            library.save_book(book.clone())?;
            if json {
                print_json(&book)
            } else {
                println!("Saved book {}", book.id);
                Ok(())
            }
        }
        BookCommand::List { available } => {
            let books = if available {
                library.available_books()?
            } else {
                library.books()?
            };
            if json {
                return print_json(&books);
            }
            println!("{:<8} {:<32} {:<24} {:<16} {}", "ID", "Title", "Author", "ISBN", "Status");
            for b in &books {
                println!("{:<8} {:<32} {:<24} {:<16} {}", b.id, b.title, b.author, b.isbn, b.status);
            }
            Ok(())
        }
        BookCommand::Delete { id } => report_delete(library.delete_book(&id)?, "book", &id, json),
    }
}

fn run_member(library: &Library, cmd: MemberCommand, json: bool) -> Result<()> {
    match cmd {
        MemberCommand::Add(fields) => {
            let member = library.add_member(&fields.name, &fields.email, &fields.phone)?;
            if json {
                print_json(&member)
            } else {
                println!("Added member {}", member.id);
                Ok(())
            }
        }
        MemberCommand::Save { id, fields } => {
            let join_date = library.member(&id)?.and_then(|m| m.join_date);
            let mut member = Member::new(id, fields.name, fields.email, fields.phone);
            member.join_date = join_date;
            library.save_member(member.clone())?;
            if json {
                print_json(&member)
            } else {
                println!("Saved member {}", member.id);
                Ok(())
            }
        }
        MemberCommand::List => {
            let members = library.members()?;
            if json {
                return print_json(&members);
            }
            println!("{:<8} {:<24} {:<28} {:<16} {}", "ID", "Name", "Email", "Phone", "Join Date");
            for m in &members {
                println!(
                    "{:<8} {:<24} {:<28} {:<16} {}",
                    m.id,
                    m.name,
                    m.email,
                    m.phone,
                    format_date(m.join_date, "N/A")
                );
            }
            Ok(())
        }
        MemberCommand::Delete { id } => report_delete(library.delete_member(&id)?, "member", &id, json),
    }
}

fn report_delete(removed: bool, kind: &str, id: &str, json: bool) -> Result<()> {
    if json {
        return print_json(&removed);
    }
    if removed {
        println!("Deleted {} {}", kind, id);
    } else {
        println!("No {} with id {}", kind, id);
    }
    Ok(())
}

fn print_loans(rows: &[LoanView]) {
    println!(
        "{:<14} {:<28} {:<20} {:<11} {:<11} {:<13} {}",
        "ID", "Book", "Member", "Issued", "Due", "Returned", "Status"
    );
    for row in rows {
        let status = if row.overdue {
            format!("{} (overdue)", row.status)
        } else {
            row.status.to_string()
        };
        println!(
            "{:<14} {:<28} {:<20} {:<11} {:<11} {:<13} {}",
            row.transaction_id,
            row.book_title,
            row.member_name,
            row.issue_date,
            format_date(row.due_date, "-"),
            format_date(row.return_date, "Not returned"),
            status
        );
    }
}

fn format_date(date: Option<NaiveDate>, missing: &str) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| missing.to_string())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
