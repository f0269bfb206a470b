// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

fn source_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("expenses")
            .long("expenses")
            .value_name("PATH")
            .help("Expenses CSV (defaults to the data-dir copy)"),
    )
    .arg(
        Arg::new("received")
            .long("received")
            .value_name("PATH")
            .help("Received CSV (defaults to the data-dir copy)"),
    )
}

pub fn build_cli() -> Command {
    Command::new("outlay")
        .about("Personal expense tracker: CSV import/export, SQLite mirror, monthly totals")
        .version(crate_version!())
        .subcommand(Command::new("init").about("Initialize the data directory and database"))
        .subcommand(
            Command::new("add")
                .about("Record a single entry")
                .subcommand(
                    Command::new("expense")
                        .about("Record an expense")
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("date")
                                .long("date")
                                .required(true)
                                .help("YYYY-MM-DD (a few common formats are also accepted)"),
                        )
                        .arg(Arg::new("place").long("place").default_value(""))
                        .arg(
                            Arg::new("autopay")
                                .long("autopay")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(
                    Command::new("received")
                        .about("Record a received amount")
                        .arg(Arg::new("sender").long("sender").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("date")
                                .long("date")
                                .required(true)
                                .help("YYYY-MM-DD (a few common formats are also accepted)"),
                        ),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("View records with optional filters")
                .subcommand(json_flags(
                    Command::new("expenses")
                        .about("View expenses")
                        .arg(Arg::new("from").long("from").value_name("DATE"))
                        .arg(Arg::new("to").long("to").value_name("DATE"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("month")
                                .long("month")
                                .value_name("YYYY-MM")
                                .help("Read from the monthly table instead of the full one"),
                        ),
                ))
                .subcommand(json_flags(
                    Command::new("received")
                        .about("View received amounts")
                        .arg(Arg::new("from").long("from").value_name("DATE"))
                        .arg(Arg::new("to").long("to").value_name("DATE"))
                        .arg(Arg::new("sender").long("sender")),
                )),
        )
        .subcommand(
            Command::new("total")
                .about("Sum amounts, optionally for one month")
                .subcommand(json_flags(
                    Command::new("expenses")
                        .about("Total expenses")
                        .arg(Arg::new("month").long("month").value_name("YYYY-MM")),
                ))
                .subcommand(json_flags(
                    Command::new("received")
                        .about("Total received")
                        .arg(Arg::new("month").long("month").value_name("YYYY-MM")),
                )),
        )
        .subcommand(json_flags(
            Command::new("balance")
                .about("Account balance: received plus prior balance minus expenses")
                .arg(Arg::new("month").long("month").value_name("YYYY-MM"))
                .arg(
                    Arg::new("prior")
                        .long("prior")
                        .value_name("AMOUNT")
                        .help("Override the stored prior balance"),
                ),
        ))
        .subcommand(
            Command::new("prior")
                .about("Manage the stored prior balance")
                .subcommand(
                    Command::new("set")
                        .about("Store a prior balance")
                        .arg(Arg::new("amount").required(true)),
                )
                .subcommand(Command::new("show").about("Show the stored prior balance")),
        )
        .subcommand(source_args(
            Command::new("import").about("Load CSV rows into the ledger and the store"),
        ))
        .subcommand(source_args(Command::new("sync").about(
            "Insert CSV rows the store is missing (dedup by full-field equality)",
        )))
        .subcommand(
            Command::new("export")
                .about("Write the ledger back to CSV")
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .value_name("DIR")
                        .help("Target directory (defaults to the data dir)"),
                )
                .arg(
                    Arg::new("monthly")
                        .long("monthly")
                        .action(ArgAction::SetTrue)
                        .help("One file per kind and month"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Display settings")
                .subcommand(
                    Command::new("currency")
                        .about("Show or set the currency symbol (display only)")
                        .arg(Arg::new("symbol")),
                ),
        )
        .subcommand(Command::new("doctor").about("Check store/partition consistency"))
}
