mod display;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use hitlens_core::Section;
use hitlens_core::case::{
    AspectFeedbackCreate, AspectType, CaseKey, FeedbackType, FinalVerdict, LoginRequest,
};
use hitlens_core::citation::extract;
use hitlens_core::verdict::aspect_verdict;
use hitlens_sync::{CaseFilter, ReviewAction, SyncClient};
use hitlens_viewer::{CitationBus, RecordViewer, Surface, ViewerConfig};
use tokio::time::Instant;
use tracing::{info, warn};

use display::TerminalSurface;

#[derive(Parser)]
#[command(name = "hitlens")]
#[command(about = "Screening hit records with citation-linked AI analyses")]
#[command(version)]
struct Cli {
    /// How long a citation highlight stays lit, in milliseconds
    #[arg(long, env = "HITLENS_HIGHLIGHT_TTL_MS", default_value_t = 3000)]
    highlight_ttl_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ApiArgs {
    #[arg(long, env = "HITLENS_API_URL", default_value = "http://localhost:8000")]
    api_url: String,
    #[arg(long, env = "HITLENS_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

impl ApiArgs {
    fn client(self) -> SyncClient {
        let client = SyncClient::new(self.api_url);
        match self.token {
            Some(token) => client.with_token(token),
            None => client,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Show one section of a hit record
    Show {
        record: PathBuf,
        /// Section to open (e.g. key-data, aliases, sources)
        #[arg(long)]
        section: Option<Section>,
        /// Case-insensitive field filter
        #[arg(long)]
        query: Option<String>,
        /// Show numbered raw lines instead of fields
        #[arg(long)]
        raw: bool,
    },
    /// Render an analysis and follow its citations into the record
    Cite {
        record: PathBuf,
        analysis: PathBuf,
        /// 1-based citation number to activate; may be repeated
        #[arg(long = "activate")]
        activate: Vec<usize>,
    },
    /// Fetch a case from the API and print its record and analyses
    Case {
        profile_id: String,
        #[arg(long)]
        dj_profile_id: Option<String>,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Log in and print an access token for HITLENS_TOKEN
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "HITLENS_PASSWORD", hide_env_values = true)]
        password: String,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Save a draft review, or submit it
    Review {
        profile_id: String,
        dj_profile_id: String,
        /// false-positive or true-match
        #[arg(long)]
        verdict: Option<FinalVerdict>,
        #[arg(long, default_value = "")]
        comments: String,
        /// Submit instead of saving a draft
        #[arg(long)]
        submit: bool,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Record operator feedback on one aspect analysis
    Feedback {
        profile_id: String,
        dj_profile_id: String,
        /// name, age, nationality, or risk
        #[arg(long)]
        aspect: AspectType,
        /// agree, disagree, or not-related
        #[arg(long)]
        feedback: FeedbackType,
        #[arg(long)]
        comment: Option<String>,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Show review statuses for several cases
    Statuses {
        /// Cases as PROFILE_ID/DJ_PROFILE_ID
        #[arg(required = true, value_parser = parse_case_key)]
        cases: Vec<CaseKey>,
        #[command(flatten)]
        api: ApiArgs,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    info!("hitlens v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config =
        ViewerConfig::default().with_highlight_ttl(Duration::from_millis(cli.highlight_ttl_ms));

    match cli.command {
        Command::Show {
            record,
            section,
            query,
            raw,
        } => {
            let text = read_text(&record)?;
            let mut viewer = RecordViewer::new(&text, config);
            if let Some(section) = section {
                viewer.select_section(section);
            }
            if let Some(query) = query {
                viewer.set_query(query);
            }
            viewer.set_raw(raw);
            TerminalSurface.draw(&viewer.render());
        }
        Command::Cite {
            record,
            analysis,
            activate,
        } => {
            let mut viewer = RecordViewer::new(&read_text(&record)?, config);
            let view = extract(&read_text(&analysis)?);
            display::print_analysis(&view);
            println!();

            let citations = view.citations();
            let bus = CitationBus::new();
            let mut subscription = bus.subscribe();
            for n in activate {
                let Some(span) = n.checked_sub(1).and_then(|i| citations.get(i)) else {
                    bail!("no citation [{n}]; the analysis has {}", citations.len());
                };
                span.activate(&bus);
            }
            drop(bus);

            while let Some(event) = subscription.recv().await {
                let act = viewer.on_citation(event, Instant::now());
                display::print_activation(&act);
            }
            println!();
            TerminalSurface.draw(&viewer.render());
        }
        Command::Case {
            profile_id,
            dj_profile_id,
            api,
        } => {
            let client = api.client();
            let case = match dj_profile_id {
                Some(dj_profile_id) => {
                    client
                        .get_case(&CaseKey {
                            profile_unique_id: profile_id,
                            dj_profile_id,
                        })
                        .await?
                }
                None => client
                    .list_cases(&CaseFilter::profile(&profile_id))
                    .await?
                    .into_iter()
                    .next()
                    .with_context(|| format!("no case for profile {profile_id}"))?,
            };
            let key = CaseKey {
                profile_unique_id: case.profile_unique_id.clone(),
                dj_profile_id: case.dj_profile_id.clone(),
            };
            let feedback = client.list_feedback(&key).await?;

            display::print_case_header(&case);
            let mut viewer = RecordViewer::new(&case.structured_record, config);
            TerminalSurface.draw(&viewer.render());

            for aspect in AspectType::ALL {
                let output = case.aspect_output(aspect);
                let verdict = aspect_verdict(output.unwrap_or(""));
                let existing = feedback.iter().find(|f| f.aspect_type == aspect);
                println!();
                for line in display::format_aspect_header(aspect, &verdict, existing) {
                    println!("{line}");
                }
                match output {
                    Some(raw) => display::print_analysis(&extract(raw)),
                    None => println!("  (no analysis)"),
                }
            }
        }
        Command::Login {
            email,
            password,
            api,
        } => {
            let token = api
                .client()
                .login(&LoginRequest { email, password })
                .await?;
            println!("{}", token.access_token);
        }
        Command::Review {
            profile_id,
            dj_profile_id,
            verdict,
            comments,
            submit,
            api,
        } => {
            if submit && verdict.is_none() {
                bail!("a verdict is required to submit a case");
            }
            let action = if submit {
                ReviewAction::Submit
            } else {
                ReviewAction::SaveDraft
            };
            let client = api.client();
            let key = CaseKey {
                profile_unique_id: profile_id,
                dj_profile_id,
            };

            let previous = match client.get_case_status(&key).await {
                Ok(status) => Some(status.case_status),
                Err(e) => {
                    warn!(error = %e, "could not read current case status");
                    None
                }
            };
            let status = client
                .save_review(&key, action, verdict, &comments, previous.as_deref())
                .await?;
            println!("  {:<26} {}", "case_status", status.case_status);
            println!("  {:<26} {}", "last_updated_at", status.last_updated_at);
        }
        Command::Feedback {
            profile_id,
            dj_profile_id,
            aspect,
            feedback,
            comment,
            api,
        } => {
            let client = api.client();
            let key = CaseKey {
                profile_unique_id: profile_id,
                dj_profile_id,
            };
            let case = client.get_case(&key).await?;
            let create = AspectFeedbackCreate {
                aspect_type: aspect,
                llm_output: Some(case.aspect_output(aspect).unwrap_or_default().to_string()),
                llm_verdict_score: Some(case.final_score.unwrap_or(0.0)),
                operator_feedback: Some(feedback),
                operator_comment: Some(comment.unwrap_or_default()),
            };
            for saved in client.save_feedbacks(&key, &[create]).await? {
                println!("{}", display::format_feedback(&saved));
            }
        }
        Command::Statuses { cases, api } => {
            let response = api.client().batch_case_status(cases).await?;
            for item in &response.items {
                println!(
                    "  {:<26} {}",
                    format!("{}/{}", item.profile_unique_id, item.dj_profile_id),
                    item.status.case_status
                );
            }
        }
    }

    Ok(())
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn parse_case_key(s: &str) -> Result<CaseKey, String> {
    match s.split_once('/') {
        Some((p, dj)) if !p.is_empty() && !dj.is_empty() => Ok(CaseKey {
            profile_unique_id: p.to_string(),
            dj_profile_id: dj.to_string(),
        }),
        _ => Err(format!("expected PROFILE_ID/DJ_PROFILE_ID, got {s:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_cite_with_repeated_activate() {
        let cli = Cli::parse_from([
            "hitlens",
            "cite",
            "record.txt",
            "risk.json",
            "--activate",
            "1",
            "--activate",
            "3",
        ]);
        match cli.command {
            Command::Cite { activate, .. } => assert_eq!(activate, vec![1, 3]),
            _ => panic!("expected cite"),
        }
    }

    #[test]
    fn parses_section_names() {
        let cli = Cli::parse_from(["hitlens", "show", "r.txt", "--section", "further-information"]);
        match cli.command {
            Command::Show { section, .. } => {
                assert_eq!(section, Some(Section::FurtherInformation))
            }
            _ => panic!("expected show"),
        }
    }

    #[test]
    fn parses_review_and_feedback_values() {
        let cli = Cli::parse_from([
            "hitlens", "review", "P-1", "DJ-2", "--verdict", "true-match", "--submit",
        ]);
        match cli.command {
            Command::Review {
                verdict, submit, ..
            } => {
                assert_eq!(verdict, Some(FinalVerdict::TrueMatch));
                assert!(submit);
            }
            _ => panic!("expected review"),
        }

        let cli = Cli::parse_from([
            "hitlens",
            "feedback",
            "P-1",
            "DJ-2",
            "--aspect",
            "nationality",
            "--feedback",
            "not-related",
        ]);
        match cli.command {
            Command::Feedback {
                aspect, feedback, ..
            } => {
                assert_eq!(aspect, AspectType::Nationality);
                assert_eq!(feedback, FeedbackType::NotRelated);
            }
            _ => panic!("expected feedback"),
        }
    }

    #[test]
    fn case_keys_need_both_ids() {
        assert_eq!(
            parse_case_key("P-1/DJ-2"),
            Ok(CaseKey {
                profile_unique_id: "P-1".into(),
                dj_profile_id: "DJ-2".into(),
            })
        );
        assert!(parse_case_key("P-1").is_err());
        assert!(parse_case_key("/DJ-2").is_err());
        assert!(Cli::try_parse_from(["hitlens", "statuses"]).is_err());
    }
}
