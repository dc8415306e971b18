use clap::{Args, Parser, Subcommand, ValueEnum};
use form_spec::{
    FieldId, FormError, FormId, FormStore, FormWriteRequest, ResponseId,
    ResponseOrder, ResponsePolicy, ResponseWriteRequest, ValidationErrors, form_request_schema,
    persist, render_form_json, render_form_text, render_forms_text, render_response_text,
    render_responses_text, response_request_schema,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const STORE_ENV: &str = "FORMS_STORE_PATH";
const DEFAULT_STORE: &str = "forms.store.json";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Form builder CLI",
    long_about = "Define forms, collect responses, and review them from a local store file"
)]
struct Cli {
    /// Store file (defaults to FORMS_STORE_PATH or ./forms.store.json).
    #[arg(long, value_name = "PATH", global = true)]
    store: Option<PathBuf>,
    /// Output format for command results.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SchemaKind {
    Form,
    Response,
}

#[derive(Subcommand)]
enum Command {
    /// Create, edit, and inspect forms.
    #[command(subcommand)]
    Form(FormCommand),
    /// Remove individual fields.
    #[command(subcommand)]
    Field(FieldCommand),
    /// Submit and review responses.
    #[command(subcommand)]
    Response(ResponseCommand),
    /// Print the JSON Schema of a write document.
    Schema {
        #[arg(long, value_enum)]
        kind: SchemaKind,
    },
}

#[derive(Args)]
struct InputArg {
    /// JSON document to apply ("-" reads stdin).
    #[arg(long, value_name = "INPUT")]
    input: PathBuf,
}

#[derive(Subcommand)]
enum FormCommand {
    /// Create a form and its fields from a JSON document.
    Create(InputArg),
    /// Apply a nested field write to an existing form.
    Update {
        #[arg(long)]
        id: u64,
        #[command(flatten)]
        input: InputArg,
    },
    /// Delete a form with its fields and responses.
    Delete {
        #[arg(long)]
        id: u64,
    },
    /// List forms with field and response counts.
    List,
    /// Show a form with its fields in position order.
    Show {
        #[arg(long)]
        id: u64,
    },
}

#[derive(Subcommand)]
enum FieldCommand {
    /// Delete a field and the answers given for it.
    Delete {
        #[arg(long)]
        id: u64,
    },
}

#[derive(Subcommand)]
enum ResponseCommand {
    /// Submit a response document.
    Submit {
        #[command(flatten)]
        input: InputArg,
        /// Reject select answers that match none of the field's options.
        #[arg(long)]
        strict_select: bool,
    },
    /// List a form's responses, newest first.
    List {
        #[arg(long)]
        form: u64,
    },
    /// Show a response with answers labelled by field.
    Show {
        #[arg(long)]
        form: u64,
        #[arg(long)]
        id: u64,
    },
    /// Print a response document with an empty answer for every field.
    Template {
        #[arg(long)]
        form: u64,
    },
    /// Delete a response and its answers.
    Delete {
        #[arg(long)]
        form: u64,
        #[arg(long)]
        id: u64,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "greentic_forms=info,form_spec=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let store_path = resolve_store_path(cli.store, env::var_os(STORE_ENV))?;
    debug!(path = %store_path.display(), "using store file");
    let mut store = persist::load(&store_path)?;

    let changed = match cli.command {
        Command::Form(command) => run_form(&mut store, command, cli.format)?,
        Command::Field(FieldCommand::Delete { id }) => {
            store.delete_field(FieldId(id))?;
            println!("Deleted field #{id}");
            true
        }
        Command::Response(command) => run_response(&mut store, command, cli.format)?,
        Command::Schema { kind } => {
            let schema = match kind {
                SchemaKind::Form => form_request_schema(),
                SchemaKind::Response => response_request_schema(),
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
            false
        }
    };

    if changed {
        persist::save(&store, &store_path)?;
    }
    Ok(())
}

fn run_form(store: &mut FormStore, command: FormCommand, format: OutputFormat) -> CliResult<bool> {
    match command {
        FormCommand::Create(input) => {
            let request: FormWriteRequest = read_document(&input.input)?;
            let id = report(store.create_form(&request), format)?;
            print_form(store, id, format, "Created")?;
            Ok(true)
        }
        FormCommand::Update { id, input } => {
            let request: FormWriteRequest = read_document(&input.input)?;
            let id = report(store.update_form(FormId(id), &request), format)?;
            print_form(store, id, format, "Updated")?;
            Ok(true)
        }
        FormCommand::Delete { id } => {
            store.delete_form(FormId(id))?;
            println!("Deleted form #{id}");
            Ok(true)
        }
        FormCommand::List => {
            let forms = store.form_summaries();
            match format {
                OutputFormat::Text => println!("{}", render_forms_text(&forms)),
                OutputFormat::Json => print_json(&forms)?,
            }
            Ok(false)
        }
        FormCommand::Show { id } => {
            print_form(store, FormId(id), format, "")?;
            Ok(false)
        }
    }
}

fn run_response(
    store: &mut FormStore,
    command: ResponseCommand,
    format: OutputFormat,
) -> CliResult<bool> {
    match command {
        ResponseCommand::Submit {
            input,
            strict_select,
        } => {
            let request: ResponseWriteRequest = read_document(&input.input)?;
            let policy = ResponsePolicy { strict_select };
            let id = report(store.submit_response(&request, &policy), format)?;
            let detail = store.response_detail(request.form_id, id)?;
            match format {
                OutputFormat::Text => {
                    println!("Submitted response #{id}");
                    println!("{}", render_response_text(&detail));
                }
                OutputFormat::Json => print_json(&detail)?,
            }
            Ok(true)
        }
        ResponseCommand::List { form } => {
            let form_id = FormId(form);
            let title = store.form(form_id)?.title.clone();
            let responses = store.responses(form_id, ResponseOrder::NewestFirst)?;
            match format {
                OutputFormat::Text => println!("{}", render_responses_text(&title, &responses)),
                OutputFormat::Json => print_json(&responses)?,
            }
            Ok(false)
        }
        ResponseCommand::Show { form, id } => {
            let detail = store.response_detail(FormId(form), ResponseId(id))?;
            match format {
                OutputFormat::Text => println!("{}", render_response_text(&detail)),
                OutputFormat::Json => print_json(&detail)?,
            }
            Ok(false)
        }
        ResponseCommand::Template { form } => {
            print_json(&store.blank_response(FormId(form))?)?;
            Ok(false)
        }
        ResponseCommand::Delete { form, id } => {
            store.delete_response(FormId(form), ResponseId(id))?;
            println!("Deleted response #{id}");
            Ok(true)
        }
    }
}

fn resolve_store_path(flag: Option<PathBuf>, env_value: Option<OsString>) -> CliResult<PathBuf> {
    let candidate = flag
        .or_else(|| env_value.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE));
    if candidate.as_os_str().is_empty() {
        return Err("store path cannot be empty".into());
    }
    Ok(candidate)
}

fn read_document<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let contents = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(path)
            .map_err(|err| format!("failed to read {}: {}", path.display(), err))?
    };
    Ok(serde_json::from_str(&contents)?)
}

/// Print validation failures in full before handing the error back.
fn report<T>(result: Result<T, FormError>, format: OutputFormat) -> CliResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(FormError::Validation(errors)) => {
            describe_validation(&errors, format)?;
            Err("validation failed".into())
        }
        Err(err) => Err(err.into()),
    }
}

fn describe_validation(errors: &ValidationErrors, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Text => {
            println!("Validation failed:");
            for error in errors {
                println!("  {}.{} - {}", error.path, error.attribute, error.message);
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({ "errors": errors }))?,
    }
    Ok(())
}

fn print_form(store: &FormStore, id: FormId, format: OutputFormat, verb: &str) -> CliResult<()> {
    let detail = store.form_detail(id)?;
    match format {
        OutputFormat::Text => {
            if !verb.is_empty() {
                println!("{verb} form #{id}");
            }
            println!("{}", render_form_text(&detail));
        }
        OutputFormat::Json => print_json(&render_form_json(&detail))?,
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn store_path_prefers_flag_then_env() {
        let flag = resolve_store_path(
            Some(PathBuf::from("flag.json")),
            Some(OsString::from("env.json")),
        )
        .unwrap();
        assert_eq!(flag, PathBuf::from("flag.json"));

        let from_env = resolve_store_path(None, Some(OsString::from("env.json"))).unwrap();
        assert_eq!(from_env, PathBuf::from("env.json"));

        let fallback = resolve_store_path(None, None).unwrap();
        assert_eq!(fallback, PathBuf::from(DEFAULT_STORE));
    }

    #[test]
    fn empty_store_path_is_rejected() {
        assert!(resolve_store_path(Some(PathBuf::new()), None).is_err());
    }

    #[test]
    fn fixture_deserializes_into_form_request() {
        let request: FormWriteRequest =
            read_document(&fixture("event_form.json")).expect("fixture should deserialize");
        assert_eq!(request.title, "Event");
        assert_eq!(request.fields.len(), 2);
    }
}
