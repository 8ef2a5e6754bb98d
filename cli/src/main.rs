use std::fmt;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use product_schema_core::{
    DataFieldDraft, DataFieldDraftProps, DataFieldId, DataFieldModification, DataFieldOptions,
    DataFieldType, DataSectionDraft, DataSectionDraftProps, DraftError, ErrorKind,
    GranularityLevel, Layout, MoveDirection, OrganizationId, SectionId, SectionModification,
    SectionType, TemplateDraft, TemplateDraftProps, TemplateId, UserId,
};
use product_schema_db::{
    DEFAULT_CONFIG_FILE, DatabaseError, SchemaStore, StoreConfig, TemplateCatalog,
};
use product_schema_sqlite::{Migration, SqliteError};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Default table prefix for the SQLite backend.
const DEFAULT_PREFIX: &str = "ps_";

/// CLI-specific section type with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliSectionType {
    Group,
    Repeatable,
}

impl From<CliSectionType> for SectionType {
    fn from(value: CliSectionType) -> Self {
        match value {
            CliSectionType::Group => Self::Group,
            CliSectionType::Repeatable => Self::Repeatable,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliGranularity {
    Model,
    Item,
}

impl From<CliGranularity> for GranularityLevel {
    fn from(value: CliGranularity) -> Self {
        match value {
            CliGranularity::Model => Self::Model,
            CliGranularity::Item => Self::Item,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliFieldType {
    TextField,
    ProductPassportLink,
    NumericField,
    FileField,
}

impl From<CliFieldType> for DataFieldType {
    fn from(value: CliFieldType) -> Self {
        match value {
            CliFieldType::TextField => Self::TextField,
            CliFieldType::ProductPassportLink => Self::ProductPassportLink,
            CliFieldType::NumericField => Self::NumericField,
            CliFieldType::FileField => Self::FileField,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliDirection {
    Up,
    Down,
}

impl From<CliDirection> for MoveDirection {
    fn from(value: CliDirection) -> Self {
        match value {
            CliDirection::Up => Self::Up,
            CliDirection::Down => Self::Down,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "schema-author")]
#[command(about = "Author, publish and store product data model templates")]
struct Cli {
    /// Configuration file (defaults to ./product-schema.yml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Store directory, overriding the configured root.
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a configuration file and create the store directories.
    Init(InitArgs),
    /// Create, inspect and delete template drafts.
    #[command(subcommand)]
    Draft(DraftCommand),
    /// Edit the sections of a draft.
    #[command(subcommand)]
    Section(SectionCommand),
    /// Edit the data fields of a section.
    #[command(subcommand)]
    Field(FieldCommand),
    /// Publish a draft as a new template version.
    Publish(PublishArgs),
    /// Inspect published templates.
    #[command(subcommand)]
    Template(TemplateCommand),
    /// SQLite database migration and seeding operations.
    Migrate(MigrateArgs),
}

#[derive(Debug, Args)]
struct InitArgs {
    /// Organization recorded on new drafts.
    #[arg(long)]
    organization: Option<String>,
    /// User recorded on new drafts and publications.
    #[arg(long)]
    user: Option<String>,
    /// Overwrite an existing configuration file.
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Subcommand)]
enum DraftCommand {
    /// Create an empty draft and print its id.
    Create(DraftCreateArgs),
    /// Print a draft as JSON.
    Show { draft: String },
    /// List stored drafts.
    List,
    /// Rename a draft.
    Rename { draft: String, name: String },
    /// Delete a draft.
    Delete { draft: String },
}

#[derive(Debug, Args)]
struct DraftCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    description: String,
    /// Sector tag; repeat for several.
    #[arg(long = "sector")]
    sectors: Vec<String>,
    #[arg(long)]
    organization: Option<String>,
    #[arg(long)]
    user: Option<String>,
}

#[derive(Debug, Subcommand)]
enum SectionCommand {
    /// Add a section and print its id.
    Add(SectionAddArgs),
    /// Delete a section together with all of its sub-sections.
    Delete { draft: String, section: String },
    /// Rename a section.
    Rename {
        draft: String,
        section: String,
        name: String,
    },
    /// Move a section one place among its siblings.
    Move {
        draft: String,
        section: String,
        #[arg(value_enum)]
        direction: CliDirection,
    },
}

#[derive(Debug, Args)]
struct SectionAddArgs {
    draft: String,
    #[arg(long)]
    name: String,
    #[arg(long = "type", value_enum, default_value = "group")]
    section_type: CliSectionType,
    #[arg(long, value_enum)]
    granularity: Option<CliGranularity>,
    /// Add as sub-section of this section.
    #[arg(long)]
    parent: Option<String>,
    /// Layout as JSON (defaults to full width).
    #[arg(long)]
    layout: Option<String>,
}

#[derive(Debug, Subcommand)]
enum FieldCommand {
    /// Add a data field to a section and print its id.
    Add(FieldAddArgs),
    /// Delete a data field.
    Delete {
        draft: String,
        section: String,
        field: String,
    },
    /// Rename a data field.
    Rename {
        draft: String,
        section: String,
        field: String,
        name: String,
    },
    /// Merge a JSON object into the options of a data field.
    Options {
        draft: String,
        section: String,
        field: String,
        options: String,
    },
    /// Move a data field one place within its section.
    Move {
        draft: String,
        section: String,
        field: String,
        #[arg(value_enum)]
        direction: CliDirection,
    },
}

#[derive(Debug, Args)]
struct FieldAddArgs {
    draft: String,
    section: String,
    #[arg(long)]
    name: String,
    #[arg(long = "type", value_enum)]
    field_type: CliFieldType,
    #[arg(long, value_enum, default_value = "model")]
    granularity: CliGranularity,
    /// Options as a JSON object.
    #[arg(long)]
    options: Option<String>,
    /// Layout as JSON (defaults to full width).
    #[arg(long)]
    layout: Option<String>,
}

#[derive(Debug, Args)]
struct PublishArgs {
    draft: String,
    /// Publishing user (defaults to the configured user).
    #[arg(long)]
    user: Option<String>,
}

#[derive(Debug, Subcommand)]
enum TemplateCommand {
    /// Print a published template as JSON.
    Show { template: String },
    /// List published templates.
    List,
}

#[derive(Debug, Args)]
struct MigrateArgs {
    #[command(subcommand)]
    operation: MigrateOperation,
}

#[derive(Debug, Subcommand)]
enum MigrateOperation {
    /// Create tables in the database.
    Up(MigrateDbArgs),
    /// Drop tables from the database.
    Down(MigrateDbArgs),
    /// Show migration and table status.
    Status(MigrateDbArgs),
    /// Import drafts and templates from the JSON store.
    Seed(MigrateSeedArgs),
}

#[derive(Debug, Args)]
struct MigrateDbArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table prefix.
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,
}

#[derive(Debug, Args)]
struct MigrateSeedArgs {
    #[command(flatten)]
    target: MigrateDbArgs,
    /// Store directory to import (defaults to the configured root).
    #[arg(long)]
    source: Option<PathBuf>,
    /// Drop and recreate the tables before importing.
    #[arg(long)]
    refresh: bool,
}

/// Failure of a command, carrying the process exit code it maps to.
#[derive(Debug)]
enum CliError {
    NotFound(String),
    Failed(String),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound(_) => 2,
            CliError::Failed(_) => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound(msg) | CliError::Failed(msg) => f.write_str(msg),
        }
    }
}

impl From<String> for CliError {
    fn from(msg: String) -> Self {
        CliError::Failed(msg)
    }
}

impl From<DraftError> for CliError {
    fn from(err: DraftError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => CliError::NotFound(err.to_string()),
            ErrorKind::Validation => CliError::Failed(err.to_string()),
        }
    }
}

impl From<DatabaseError> for CliError {
    fn from(err: DatabaseError) -> Self {
        if err.is_not_found() {
            CliError::NotFound(err.to_string())
        } else {
            CliError::Failed(err.to_string())
        }
    }
}

impl From<SqliteError> for CliError {
    fn from(err: SqliteError) -> Self {
        if err.is_not_found() {
            CliError::NotFound(err.to_string())
        } else {
            CliError::Failed(err.to_string())
        }
    }
}

type CliResult = Result<(), CliError>;

/// Resolved configuration plus the path it came from.
struct Session {
    config: StoreConfig,
    config_path: PathBuf,
}

impl Session {
    fn load(cli: &Cli) -> Result<Self, CliError> {
        let (config, config_path) = match &cli.config {
            Some(path) => {
                let config = StoreConfig::load(path).map_err(|e| {
                    format!("Failed to load config '{}': {e}", path.display())
                })?;
                (config, path.clone())
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    let config = StoreConfig::load(&path).map_err(|e| {
                        format!("Failed to load config '{}': {e}", path.display())
                    })?;
                    (config, path)
                } else {
                    (StoreConfig::default(), path)
                }
            }
        };
        let mut config = config;
        if let Some(root) = &cli.root {
            config.root = root.clone();
        }
        debug!(root = %config.root.display(), "resolved configuration");
        Ok(Self {
            config,
            config_path,
        })
    }

    fn store(&self) -> Result<SchemaStore, CliError> {
        let store = SchemaStore::open(&self.config.root).map_err(|e| {
            format!(
                "Failed to open store '{}': {e}",
                self.config.root.display()
            )
        })?;
        Ok(store.with_pretty(self.config.output.pretty))
    }

    fn user(&self, explicit: Option<String>) -> UserId {
        UserId::from(explicit.unwrap_or_else(|| self.config.defaults.user.clone()))
    }

    fn organization(&self, explicit: Option<String>) -> OrganizationId {
        OrganizationId::from(
            explicit.unwrap_or_else(|| self.config.defaults.organization.clone()),
        )
    }

    fn print_json<T: Serialize>(&self, value: &T) -> CliResult {
        let text = if self.config.output.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
        println!("{text}");
        Ok(())
    }

    /// Loads a draft, applies `edit`, and saves it back.
    fn edit_draft<T>(
        &self,
        draft_id: &str,
        edit: impl FnOnce(&mut TemplateDraft) -> Result<T, DraftError>,
    ) -> Result<T, CliError> {
        let store = self.store()?;
        let id = TemplateId::from(draft_id);
        let mut draft = store.load_draft(&id)?;
        let value = edit(&mut draft)?;
        store.save_draft(&draft)?;
        Ok(value)
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = Session::load(&cli).and_then(|session| match cli.command {
        Command::Init(args) => run_init(&session, args),
        Command::Draft(cmd) => run_draft(&session, cmd),
        Command::Section(cmd) => run_section(&session, cmd),
        Command::Field(cmd) => run_field(&session, cmd),
        Command::Publish(args) => run_publish(&session, args),
        Command::Template(cmd) => run_template(&session, cmd),
        Command::Migrate(args) => run_migrate(&session, args),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn run_init(session: &Session, args: InitArgs) -> CliResult {
    let path = &session.config_path;
    if path.exists() && !args.force {
        return Err(format!(
            "Config '{}' already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }
    let mut config = session.config.clone();
    if let Some(organization) = args.organization {
        config.defaults.organization = organization;
    }
    if let Some(user) = args.user {
        config.defaults.user = user;
    }
    config
        .save(path)
        .map_err(|e| format!("Failed to write config '{}': {e}", path.display()))?;
    session.store()?;
    println!(
        "Initialized store at '{}' (config '{}').",
        config.root.display(),
        path.display()
    );
    Ok(())
}

fn run_draft(session: &Session, cmd: DraftCommand) -> CliResult {
    match cmd {
        DraftCommand::Create(args) => {
            let draft = TemplateDraft::create(TemplateDraftProps {
                name: args.name,
                description: args.description,
                sectors: args.sectors,
                organization_id: session.organization(args.organization),
                user_id: session.user(args.user),
            });
            session.store()?.save_draft(&draft)?;
            println!("{}", draft.id());
            Ok(())
        }
        DraftCommand::Show { draft } => {
            let draft = session.store()?.load_draft(&TemplateId::from(draft))?;
            session.print_json(&draft)
        }
        DraftCommand::List => {
            let store = session.store()?;
            for id in store.list_drafts()? {
                let draft = store.load_draft(&id)?;
                let latest = draft
                    .latest_publication()
                    .map(|p| p.version.to_string())
                    .unwrap_or_else(|| "unpublished".to_string());
                println!("{id}\t{}\t{latest}", draft.name());
            }
            Ok(())
        }
        DraftCommand::Rename { draft, name } => session.edit_draft(&draft, |d| {
            d.rename(name);
            Ok(())
        }),
        DraftCommand::Delete { draft } => {
            session.store()?.delete_draft(&TemplateId::from(draft))?;
            Ok(())
        }
    }
}

fn parse_layout(layout: Option<&str>) -> Result<Layout, CliError> {
    match layout {
        Some(text) => {
            serde_json::from_str(text).map_err(|e| CliError::Failed(format!("Invalid layout: {e}")))
        }
        None => Ok(Layout::full_width()),
    }
}

fn parse_options(text: &str) -> Result<DataFieldOptions, CliError> {
    serde_json::from_str(text)
        .map_err(|e| CliError::Failed(format!("Options must be a JSON object: {e}")))
}

fn run_section(session: &Session, cmd: SectionCommand) -> CliResult {
    match cmd {
        SectionCommand::Add(args) => {
            let section = DataSectionDraft::create(DataSectionDraftProps {
                name: args.name,
                section_type: args.section_type.into(),
                layout: parse_layout(args.layout.as_deref())?,
                granularity_level: args.granularity.map(Into::into),
            })
            .map_err(DraftError::from)?;
            let id = section.id().clone();
            session.edit_draft(&args.draft, |draft| match args.parent {
                Some(parent) => draft.add_sub_section(&SectionId::from(parent), section),
                None => draft.add_section(section),
            })?;
            println!("{id}");
            Ok(())
        }
        SectionCommand::Delete { draft, section } => {
            session.edit_draft(&draft, |d| d.delete_section(&SectionId::from(section)))
        }
        SectionCommand::Rename {
            draft,
            section,
            name,
        } => session.edit_draft(&draft, |d| {
            d.modify_section(
                &SectionId::from(section),
                SectionModification {
                    name: Some(name),
                    layout: None,
                },
            )
        }),
        SectionCommand::Move {
            draft,
            section,
            direction,
        } => session.edit_draft(&draft, |d| {
            d.move_section(&SectionId::from(section), direction.into())
        }),
    }
}

fn run_field(session: &Session, cmd: FieldCommand) -> CliResult {
    match cmd {
        FieldCommand::Add(args) => {
            let options = args.options.as_deref().map(parse_options).transpose()?;
            let field = DataFieldDraft::create(DataFieldDraftProps {
                name: args.name,
                field_type: args.field_type.into(),
                options,
                layout: parse_layout(args.layout.as_deref())?,
                granularity_level: args.granularity.into(),
            });
            let id = field.id().clone();
            session.edit_draft(&args.draft, |d| {
                d.add_data_field_to_section(&SectionId::from(args.section), field)
            })?;
            println!("{id}");
            Ok(())
        }
        FieldCommand::Delete {
            draft,
            section,
            field,
        } => session.edit_draft(&draft, |d| {
            d.delete_data_field_of_section(&SectionId::from(section), &DataFieldId::from(field))
                .map(|_| ())
        }),
        FieldCommand::Rename {
            draft,
            section,
            field,
            name,
        } => session.edit_draft(&draft, |d| {
            d.modify_data_field(
                &SectionId::from(section),
                &DataFieldId::from(field),
                DataFieldModification {
                    name: Some(name),
                    ..Default::default()
                },
            )
        }),
        FieldCommand::Options {
            draft,
            section,
            field,
            options,
        } => {
            let options = parse_options(&options)?;
            session.edit_draft(&draft, |d| {
                d.modify_data_field(
                    &SectionId::from(section),
                    &DataFieldId::from(field),
                    DataFieldModification {
                        options: Some(options),
                        ..Default::default()
                    },
                )
            })
        }
        FieldCommand::Move {
            draft,
            section,
            field,
            direction,
        } => session.edit_draft(&draft, |d| {
            d.move_data_field(
                &SectionId::from(section),
                &DataFieldId::from(field),
                direction.into(),
            )
        }),
    }
}

fn run_publish(session: &Session, args: PublishArgs) -> CliResult {
    let store = session.store()?;
    let template = store.publish_draft(&TemplateId::from(args.draft), session.user(args.user))?;
    println!("{}\t{}", template.id(), template.version());
    Ok(())
}

fn run_template(session: &Session, cmd: TemplateCommand) -> CliResult {
    let store = session.store()?;
    match cmd {
        TemplateCommand::Show { template } => {
            let template = store.load_template(&TemplateId::from(template))?;
            session.print_json(&template)
        }
        TemplateCommand::List => {
            let catalog = TemplateCatalog::from_dir(store.templates_dir())?;
            for id in catalog.ids() {
                if let Some(template) = catalog.get(id) {
                    println!("{id}\t{}\t{}", template.name(), template.version());
                }
            }
            Ok(())
        }
    }
}

fn open_migration(args: &MigrateDbArgs) -> Result<Migration, CliError> {
    let conn = rusqlite::Connection::open(&args.db)
        .map_err(|e| format!("Failed to open database '{}': {e}", args.db.display()))?;
    let migration = Migration::new(conn, &args.prefix)
        .map_err(|e| format!("Failed to initialize migration: {e}"))?;
    Ok(migration)
}

fn run_migrate(session: &Session, args: MigrateArgs) -> CliResult {
    match args.operation {
        MigrateOperation::Up(a) => run_migrate_up(&a),
        MigrateOperation::Down(a) => run_migrate_down(&a),
        MigrateOperation::Status(a) => run_migrate_status(&a),
        MigrateOperation::Seed(a) => {
            let source = a.source.clone().unwrap_or_else(|| session.config.root.clone());
            run_migrate_seed(&a, &source)
        }
    }
}

fn run_migrate_up(args: &MigrateDbArgs) -> CliResult {
    let mut migration = open_migration(args)?;
    migration
        .up()
        .map_err(|e| format!("Migration up failed: {e}"))?;
    println!(
        "Migration up complete. Tables created with prefix '{}' in '{}'.",
        args.prefix,
        args.db.display()
    );
    Ok(())
}

fn run_migrate_down(args: &MigrateDbArgs) -> CliResult {
    let mut migration = open_migration(args)?;
    migration
        .down()
        .map_err(|e| format!("Migration down failed: {e}"))?;
    println!(
        "Migration down complete. Tables with prefix '{}' dropped from '{}'.",
        args.prefix,
        args.db.display()
    );
    Ok(())
}

fn run_migrate_status(args: &MigrateDbArgs) -> CliResult {
    let migration = open_migration(args)?;
    let status = migration
        .status()
        .map_err(|e| format!("Failed to get migration status: {e}"))?;
    println!("Migration Status:");
    println!(
        "  Tables exist: {}",
        if status.tables_exist { "yes" } else { "no" }
    );
    println!("  Draft count: {}", status.draft_count);
    println!("  Section count: {}", status.section_count);
    println!("  Field count: {}", status.field_count);
    println!("  Publication count: {}", status.publication_count);
    println!("  Template count: {}", status.template_count);
    Ok(())
}

fn run_migrate_seed(args: &MigrateSeedArgs, source: &Path) -> CliResult {
    let mut migration = open_migration(&args.target)?;
    let report = if args.refresh {
        migration.refresh(source)?
    } else {
        migration.seed(source)?
    };
    println!("Seed complete:");
    println!("  Drafts inserted: {}", report.drafts_inserted);
    println!("  Templates inserted: {}", report.templates_inserted);
    println!("  Sections inserted: {}", report.sections_inserted);
    println!("  Fields inserted: {}", report.fields_inserted);
    Ok(())
}
