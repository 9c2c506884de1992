//! Command-line front end for the visual FHIRPath editor core
//!
//! Every subcommand reads a program JSON file (`{"bindings": [...], "expression": [...]}`).

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use octofhir_fhirpath_editor::EditorConfig;
use octofhir_fhirpath_editor::analyzer::diagnostics::DiagnosticSeverity;
use octofhir_fhirpath_editor::analyzer::{
    BindingTypes, CompletionProvider, LiteralDefaults, Program, SuggestionContext, TypeAnalyzer,
    TypeCache, collect_diagnostics, transitive_dependents,
};
use octofhir_fhirpath_editor::model::{FhirSchema, FieldResolver, QuestionnaireItemRegistry, Type};
use octofhir_fhirpath_editor::parser::{Token, UnparseOptions, unparse_program};

#[derive(Parser)]
#[command(name = "fhirpath-editor")]
#[command(about = "Type-check, complete and render visually composed FHIRPath programs")]
#[command(version)]
#[command(author = "OctoFHIR Team <funyloony@gmail.com>")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Type every binding and the main expression, reporting diagnostics
    Check {
        #[command(flatten)]
        input: Input,
        /// Print types and diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Suggest tokens for the next slot of an expression
    Suggest {
        #[command(flatten)]
        input: Input,
        /// Binding (id or name) whose expression is completed, the main expression otherwise
        #[arg(short, long)]
        binding: Option<String>,
        /// Suggest replacements for the token at this index instead of the next token
        #[arg(long)]
        at: Option<usize>,
        /// Treat the expression as a function argument, offering `$this` and `$index`
        #[arg(long)]
        lambda: bool,
        /// Show incompatible functions and operators too
        #[arg(long)]
        all: bool,
    },
    /// Print the FHIRPath text of the program
    Unparse {
        #[command(flatten)]
        input: Input,
        /// Render `$this`/`$index` as `%__this`/`%__index`
        #[arg(long)]
        mock_specials: bool,
    },
    /// Print the dependency order, or the dependents of one binding
    Deps {
        #[command(flatten)]
        input: Input,
        /// Binding (id or name) whose transitive dependents are printed
        #[arg(short, long)]
        binding: Option<String>,
    },
}

#[derive(Args)]
struct Input {
    /// Program JSON file
    program: PathBuf,
    /// FHIR schema JSON file, defaults to the bundled R4 subset
    #[arg(long)]
    schema: Option<PathBuf>,
    /// Questionnaire JSON file providing answer tokens
    #[arg(long)]
    questionnaire: Option<PathBuf>,
    /// Resource type the expressions are evaluated against, e.g. Patient
    #[arg(short, long)]
    context: Option<String>,
    /// Editor configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Everything loaded from an [`Input`]
struct Session {
    program: Program,
    analyzer: TypeAnalyzer,
    external: BindingTypes,
    context: Type,
}

impl Input {
    fn load(&self) -> Result<Session> {
        let program = Program::from_json(&read(&self.program)?)
            .with_context(|| format!("invalid program in {}", self.program.display()))?;

        let config = match &self.config {
            Some(path) => EditorConfig::from_file(path)?,
            None => EditorConfig::default(),
        };

        let resolver: Arc<dyn FieldResolver> = match &self.schema {
            Some(path) => Arc::new(FhirSchema::from_file(path)?),
            None => Arc::new(FhirSchema::bundled()),
        };

        let mut analyzer = TypeAnalyzer::new(resolver).with_config(config.clone());
        if let Some(cache) = TypeCache::new(config.type_cache_size) {
            analyzer = analyzer.with_cache(cache);
        }
        if let Some(path) = &self.questionnaire {
            let items = QuestionnaireItemRegistry::from_json(&read(path)?)
                .with_context(|| format!("invalid questionnaire in {}", path.display()))?;
            analyzer = analyzer.with_questionnaire(Arc::new(items));
        }

        let mut external = BindingTypes::new();
        let context = match &self.context {
            Some(resource_type) => {
                let ty = Type::single(Type::complex([resource_type.as_str()]));
                external.insert(config.resource_binding.clone(), ty.clone());
                ty
            }
            None => Type::Null,
        };

        Ok(Session {
            program,
            analyzer,
            external,
            context,
        })
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn main() {
    human_panic::setup_panic!();
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Check { input, json } => handle_check(&input, json),
        Commands::Suggest {
            input,
            binding,
            at,
            lambda,
            all,
        } => handle_suggest(&input, binding.as_deref(), at, lambda, all),
        Commands::Unparse {
            input,
            mock_specials,
        } => handle_unparse(&input, mock_specials),
        Commands::Deps { input, binding } => handle_deps(&input, binding.as_deref()),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            process::exit(2);
        }
    }
}

/// Find a binding id by id or name
fn binding_id(program: &Program, key: &str) -> Result<String> {
    let bindings = &program.bindings;
    bindings
        .iter()
        .find(|binding| binding.id == key)
        .or_else(|| bindings.iter().find(|binding| binding.name == key))
        .map(|binding| binding.id.clone())
        .with_context(|| format!("no binding with id or name {key}"))
}

fn handle_check(input: &Input, json: bool) -> Result<bool> {
    let session = input.load()?;
    let types = session
        .program
        .type_program(&session.analyzer, &session.external, &session.context)?;
    let diagnostics = collect_diagnostics(&session.program, &types);
    let clean = !diagnostics.iter().any(|diagnostic| diagnostic.is_error());

    if json {
        let report = serde_json::json!({ "types": types, "diagnostics": diagnostics });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(clean);
    }

    for binding in &session.program.bindings {
        if let Some(ty) = types.binding(&binding.id) {
            let rendered = if ty.is_invalid() {
                "invalid".red().to_string()
            } else {
                ty.describe().green().to_string()
            };
            println!("%{}: {rendered}", binding.name.bold());
        }
    }
    if let Some(ty) = &types.expression {
        println!("{}: {}", "expression".bold(), ty.describe());
    }

    for diagnostic in &diagnostics {
        let line = diagnostic.to_string();
        match diagnostic.severity {
            DiagnosticSeverity::Error => eprintln!("{}", line.red()),
            DiagnosticSeverity::Warning => eprintln!("{}", line.yellow()),
        }
    }
    if let Some(cache) = session.analyzer.cache() {
        let stats = cache.stats();
        log::debug!(
            "type cache: {} of {} entries, {:.0}% hits",
            stats.len,
            stats.capacity,
            stats.hit_rate() * 100.0
        );
    }
    Ok(clean)
}

fn handle_suggest(
    input: &Input,
    binding: Option<&str>,
    at: Option<usize>,
    lambda: bool,
    all: bool,
) -> Result<bool> {
    let session = input.load()?;
    let program = &session.program;
    let types = program
        .type_program(&session.analyzer, &session.external, &session.context)?;

    let id = binding.map(|key| binding_id(program, key)).transpose()?;
    let tokens: &[Token] = match &id {
        Some(id) => &program.require_binding(id)?.expression,
        None => &program.expression,
    };
    if let Some(index) = at {
        if index >= tokens.len() {
            bail!(
                "no token at index {index}, the expression has {} tokens",
                tokens.len()
            );
        }
    }

    let scope = program.scope_for(id.as_deref(), &types, &session.external);
    let defaults = LiteralDefaults::from_config(
        chrono::Local::now().naive_local(),
        session.analyzer.config(),
    );
    let context = SuggestionContext {
        bindings: &scope,
        context: &session.context,
        in_lambda: lambda,
        defaults: &defaults,
    };

    let provider = CompletionProvider::new(&session.analyzer);
    let suggestions = match at {
        Some(index) => provider.suggest_tokens_at(tokens, index, &context),
        None => provider.suggest_next_tokens(tokens, &context),
    };

    let mut heading = None;
    for suggestion in suggestions.iter().filter(|s| all || !s.incompatible) {
        let kind = suggestion.token.kind().to_string();
        let group = suggestion.group.clone().unwrap_or(kind);
        if heading.as_ref() != Some(&group) {
            println!("{}", group.bold().underline());
            heading = Some(group);
        }
        let label = if suggestion.incompatible {
            suggestion.label.dimmed().to_string()
        } else {
            suggestion.label.clone()
        };
        match &suggestion.detail {
            Some(detail) => println!("  {label}  {}", detail.cyan()),
            None => println!("  {label}"),
        }
    }
    Ok(true)
}

fn handle_unparse(input: &Input, mock_specials: bool) -> Result<bool> {
    let session = input.load()?;
    let options = UnparseOptions {
        resource_binding: &session.analyzer.config().resource_binding,
        bindings_order: None,
        mock_specials,
    };
    println!("{}", unparse_program(&session.program, &options));
    Ok(true)
}

fn handle_deps(input: &Input, binding: Option<&str>) -> Result<bool> {
    let session = input.load()?;
    let program = &session.program;
    let name = |id: &str| {
        program
            .binding(id)
            .map_or_else(|| id.to_string(), |binding| binding.name.clone())
    };

    match binding {
        Some(key) => {
            let id = binding_id(program, key)?;
            for dependent in transitive_dependents(&program.dependency_graph(), &id) {
                println!("{}", name(&dependent));
            }
        }
        None => {
            for (id, position) in program.bindings_order() {
                println!("{position:>3}  {}", name(&id));
            }
        }
    }
    Ok(true)
}
