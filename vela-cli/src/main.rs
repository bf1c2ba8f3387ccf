use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use vela_core::differ::create_plan;
use vela_core::effect::Effect;
use vela_core::plan::{Plan, format_effect_brief};
use vela_core::provider::Provider;
use vela_core::resource::{Resource, ResourceId, State, Value};
use vela_core::schema::ResourceSchema;
use vela_provider_dlc::DlcProvider;
use vela_provider_dlc::resources::resource_types;
use vela_state::backends::LocalBackend;
use vela_state::{LockInfo, ResourceState, StateBackend, StateFile};

mod manifest;

#[derive(Parser)]
#[command(name = "vela")]
#[command(about = "Declarative management of Tencent Cloud DLC resources", long_about = None)]
struct Cli {
    /// Path to the state file
    #[arg(long, global = true, default_value = "vela.state.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the manifest against resource schemas
    Validate {
        /// Path to the manifest file
        #[arg(default_value = "vela.json")]
        file: PathBuf,
    },
    /// Show the execution plan without applying changes
    Plan {
        /// Path to the manifest file
        #[arg(default_value = "vela.json")]
        file: PathBuf,
    },
    /// Apply changes to reach the desired state
    Apply {
        /// Path to the manifest file
        #[arg(default_value = "vela.json")]
        file: PathBuf,
    },
    /// Destroy all resources recorded in state for this manifest
    Destroy {
        /// Path to the manifest file
        #[arg(default_value = "vela.json")]
        file: PathBuf,

        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
    /// State inspection commands
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
    /// Forcibly release a stale state lock
    ForceUnlock {
        /// Lock id as recorded in the lock file
        lock_id: String,
    },
}

#[derive(Subcommand)]
enum StateCommands {
    /// List resources recorded in state
    List,
    /// Show a single resource (address: type.name, e.g. dlc.data_engine.main)
    Show { address: String },
    /// Remove a resource from state without deleting it
    Rm { address: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let backend = LocalBackend::with_path(cli.state);

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Plan { file } => run_plan(&file, &backend).await,
        Commands::Apply { file } => run_apply(&file, &backend).await,
        Commands::Destroy { file, auto_approve } => {
            run_destroy(&file, &backend, auto_approve).await
        }
        Commands::State { command } => run_state_command(command, &backend).await,
        Commands::ForceUnlock { lock_id } => run_force_unlock(&lock_id, &backend).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn get_schemas() -> HashMap<String, ResourceSchema> {
    let mut all_schemas = HashMap::new();
    for resource_type in resource_types() {
        all_schemas.insert(resource_type.name().to_string(), resource_type.schema());
    }
    all_schemas
}

fn validate_resources(resources: &[Resource]) -> Result<(), String> {
    let schemas = get_schemas();
    let mut all_errors = Vec::new();

    for resource in resources {
        let Some(schema) = schemas.get(&resource.id.resource_type) else {
            all_errors.push(format!(
                "{}.{}: unknown resource type",
                resource.id.resource_type, resource.id.name
            ));
            continue;
        };
        if let Err(errors) = schema.validate(&resource.attributes) {
            for error in errors {
                all_errors.push(format!(
                    "{}.{}: {}",
                    resource.id.resource_type, resource.id.name, error
                ));
            }
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors.join("\n"))
    }
}

fn run_validate(file: &PathBuf) -> Result<(), String> {
    let resources = manifest::load(file)?;

    println!("{}", "Validating...".cyan());
    validate_resources(&resources)?;

    println!(
        "{}",
        format!("✓ {} resources validated successfully.", resources.len())
            .green()
            .bold()
    );
    for resource in &resources {
        println!("  • {}.{}", resource.id.resource_type, resource.id.name);
    }

    Ok(())
}

async fn load_state(backend: &LocalBackend) -> Result<StateFile, String> {
    backend.init().await.map_err(|e| e.to_string())?;
    Ok(backend
        .read_state()
        .await
        .map_err(|e| e.to_string())?
        .unwrap_or_default())
}

/// Read the live state of every managed resource, using identifiers
/// recorded in the state file where available
async fn read_current_states(
    provider: &DlcProvider,
    resources: &[Resource],
    state_file: &StateFile,
) -> Result<HashMap<ResourceId, State>, String> {
    let mut current_states = HashMap::new();

    for resource in resources {
        if resource.is_data_source() {
            continue;
        }
        let identifier = state_file
            .find_resource(&resource.id.resource_type, &resource.id.name)
            .and_then(|r| r.identifier.as_deref());
        let state = provider
            .read(&resource.id, identifier)
            .await
            .map_err(|e| format!("Failed to read state: {}", e))?;
        current_states.insert(resource.id.clone(), state);
    }

    Ok(current_states)
}

/// Append Delete effects for resources in state but no longer in the manifest
fn append_orphan_deletes(plan: &mut Plan, resources: &[Resource], state_file: &StateFile) {
    let desired: HashSet<(String, String)> = resources
        .iter()
        .map(|r| (r.id.resource_type.clone(), r.id.name.clone()))
        .collect();

    for recorded in state_file.resources.iter().rev() {
        let key = (recorded.resource_type.clone(), recorded.name.clone());
        if !desired.contains(&key) {
            plan.add(Effect::Delete(ResourceId::new(
                recorded.resource_type.clone(),
                recorded.name.clone(),
            )));
        }
    }
}

async fn build_plan(
    resources: &[Resource],
    provider: &DlcProvider,
    state_file: &StateFile,
) -> Result<(Plan, HashMap<ResourceId, State>), String> {
    let current_states = read_current_states(provider, resources, state_file).await?;
    let mut plan = create_plan(resources, &current_states, &get_schemas());
    append_orphan_deletes(&mut plan, resources, state_file);
    Ok((plan, current_states))
}

async fn run_plan(file: &PathBuf, backend: &LocalBackend) -> Result<(), String> {
    let resources = manifest::load(file)?;
    validate_resources(&resources)?;

    let provider = DlcProvider::from_env().map_err(|e| e.to_string())?;
    let state_file = load_state(backend).await?;
    let (plan, _) = build_plan(&resources, &provider, &state_file).await?;

    print_plan(&plan);
    Ok(())
}

fn print_plan(plan: &Plan) {
    if plan.is_empty() {
        println!("{}", "No changes. Infrastructure is up-to-date.".green());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for effect in plan.effects() {
        let line = format_effect_brief(effect);
        let colored_line = match effect {
            Effect::Create(_) => line.green(),
            Effect::Update { .. } => line.yellow(),
            Effect::Delete(_) => line.red(),
            Effect::Read(_) => line.normal(),
        };
        println!("  {}", colored_line);

        if let Effect::Update { from, to, .. } = effect {
            let mut keys: Vec<_> = to
                .attributes
                .keys()
                .filter(|k| from.attributes.get(*k) != to.attributes.get(*k))
                .collect();
            keys.sort();
            for key in keys {
                println!(
                    "      {}: {} -> {}",
                    key,
                    format_value(from.attributes.get(key)).red(),
                    format_value(to.attributes.get(key)).green()
                );
            }
        }
    }

    println!();
    println!("{}", plan.summary());
}

fn format_value(value: Option<&Value>) -> String {
    match value {
        Some(v) => v.to_json().to_string(),
        None => "(unset)".to_string(),
    }
}

fn resource_state_from(state: &State) -> ResourceState {
    let mut recorded = ResourceState::new(
        state.id.resource_type.clone(),
        state.id.name.clone(),
        "dlc",
    );
    recorded.identifier = state.identifier.clone();
    for (key, value) in &state.attributes {
        recorded.attributes.insert(key.clone(), value.to_json());
    }
    recorded
}

async fn run_apply(file: &PathBuf, backend: &LocalBackend) -> Result<(), String> {
    let resources = manifest::load(file)?;
    validate_resources(&resources)?;

    let provider = DlcProvider::from_env().map_err(|e| e.to_string())?;

    let lock = backend
        .acquire_lock("apply")
        .await
        .map_err(|e| e.to_string())?;
    let result = apply_locked(&resources, &provider, backend).await;
    release(backend, &lock).await;
    result
}

async fn apply_locked(
    resources: &[Resource],
    provider: &DlcProvider,
    backend: &LocalBackend,
) -> Result<(), String> {
    let mut state_file = load_state(backend).await?;
    let (plan, _) = build_plan(resources, provider, &state_file).await?;

    if plan.is_empty() {
        println!("{}", "No changes needed.".green());
        return Ok(());
    }

    print_plan(&plan);
    println!();
    println!("{}", "Applying changes...".cyan().bold());
    println!();

    let mut success_count = 0;
    let mut failure_count = 0;

    for effect in plan.effects() {
        match effect {
            Effect::Create(resource) => match provider.create(resource).await {
                Ok(state) => {
                    println!("  {} {}", "✓".green(), format_effect_brief(effect));
                    success_count += 1;
                    state_file.upsert_resource(resource_state_from(&state));
                }
                Err(e) => {
                    println!("  {} {} - {}", "✗".red(), format_effect_brief(effect), e);
                    failure_count += 1;
                }
            },
            Effect::Update { id, from, to } => {
                let identifier = from.identifier.clone().unwrap_or_default();
                match provider.update(id, &identifier, from, to).await {
                    Ok(state) => {
                        println!("  {} {}", "✓".green(), format_effect_brief(effect));
                        success_count += 1;
                        state_file.upsert_resource(resource_state_from(&state));
                    }
                    Err(e) => {
                        println!("  {} {} - {}", "✗".red(), format_effect_brief(effect), e);
                        failure_count += 1;
                    }
                }
            }
            Effect::Delete(id) => {
                let identifier = state_file
                    .find_resource(&id.resource_type, &id.name)
                    .and_then(|r| r.identifier.clone())
                    .unwrap_or_default();
                match provider.delete(id, &identifier).await {
                    Ok(()) => {
                        println!("  {} {}", "✓".green(), format_effect_brief(effect));
                        success_count += 1;
                        state_file.remove_resource(&id.resource_type, &id.name);
                    }
                    Err(e) => {
                        println!("  {} {} - {}", "✗".red(), format_effect_brief(effect), e);
                        failure_count += 1;
                    }
                }
            }
            Effect::Read(resource) => match provider.read_data_source(resource).await {
                Ok(state) => {
                    let count = state
                        .attributes
                        .get("total_count")
                        .and_then(Value::as_int)
                        .unwrap_or(0);
                    println!(
                        "  {} {} ({} items)",
                        "✓".green(),
                        format_effect_brief(effect),
                        count
                    );
                    success_count += 1;
                }
                Err(e) => {
                    println!("  {} {} - {}", "✗".red(), format_effect_brief(effect), e);
                    failure_count += 1;
                }
            },
        }
    }

    state_file.increment_serial();
    backend
        .write_state(&state_file)
        .await
        .map_err(|e| format!("Failed to write state: {}", e))?;

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Apply complete! {} changes applied.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Apply failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

async fn run_destroy(
    file: &PathBuf,
    backend: &LocalBackend,
    auto_approve: bool,
) -> Result<(), String> {
    let resources = manifest::load(file)?;

    let provider = DlcProvider::from_env().map_err(|e| e.to_string())?;

    let lock = backend
        .acquire_lock("destroy")
        .await
        .map_err(|e| e.to_string())?;
    let result = destroy_locked(&resources, &provider, backend, auto_approve).await;
    release(backend, &lock).await;
    result
}

async fn destroy_locked(
    resources: &[Resource],
    provider: &DlcProvider,
    backend: &LocalBackend,
    auto_approve: bool,
) -> Result<(), String> {
    let mut state_file = load_state(backend).await?;

    // Destroy in reverse manifest order (dependents before dependencies)
    let targets: Vec<(ResourceId, String)> = resources
        .iter()
        .rev()
        .filter(|r| !r.is_data_source())
        .filter_map(|r| {
            state_file
                .find_resource(&r.id.resource_type, &r.id.name)
                .map(|recorded| {
                    (
                        r.id.clone(),
                        recorded.identifier.clone().unwrap_or_default(),
                    )
                })
        })
        .collect();

    if targets.is_empty() {
        println!("{}", "No resources to destroy.".green());
        return Ok(());
    }

    println!("{}", "Destroy Plan:".red().bold());
    println!();
    for (id, _) in &targets {
        println!("  {} {}.{}", "-".red().bold(), id.resource_type, id.name);
    }
    println!();
    println!("Plan: {} to destroy.", targets.len().to_string().red());
    println!();

    if !auto_approve && !confirm_destroy()? {
        println!("{}", "Destroy cancelled.".yellow());
        return Ok(());
    }

    println!("{}", "Destroying resources...".red().bold());
    println!();

    let mut success_count = 0;
    let mut failure_count = 0;

    for (id, identifier) in &targets {
        let effect = Effect::Delete(id.clone());
        match provider.delete(id, identifier).await {
            Ok(()) => {
                println!("  {} {}", "✓".green(), format_effect_brief(&effect));
                success_count += 1;
                state_file.remove_resource(&id.resource_type, &id.name);
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), format_effect_brief(&effect), e);
                failure_count += 1;
            }
        }
    }

    state_file.increment_serial();
    backend
        .write_state(&state_file)
        .await
        .map_err(|e| format!("Failed to write state: {}", e))?;

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Destroy complete! {} resources destroyed.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Destroy failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

fn confirm_destroy() -> Result<bool, String> {
    println!(
        "{}",
        "Do you really want to destroy all resources?".yellow().bold()
    );
    println!(
        "  {}",
        "This action cannot be undone. Type 'yes' to confirm.".yellow()
    );
    print!("\n  Enter a value: ");
    std::io::Write::flush(&mut std::io::stdout()).map_err(|e| e.to_string())?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| e.to_string())?;
    println!();

    Ok(input.trim() == "yes")
}

async fn run_state_command(command: StateCommands, backend: &LocalBackend) -> Result<(), String> {
    match command {
        StateCommands::List => {
            let state_file = load_state(backend).await?;
            if state_file.resources.is_empty() {
                println!("{}", "State is empty.".yellow());
                return Ok(());
            }
            for resource in &state_file.resources {
                println!("{}.{}", resource.resource_type, resource.name);
            }
            Ok(())
        }
        StateCommands::Show { address } => {
            let (resource_type, name) = split_address(&address)?;
            let state_file = load_state(backend).await?;
            let resource = state_file
                .find_resource(resource_type, name)
                .ok_or_else(|| format!("No resource in state for {}", address))?;

            println!("{}", format!("# {}", address).cyan().bold());
            if let Some(identifier) = &resource.identifier {
                println!("identifier = {}", identifier);
            }
            let pretty = serde_json::to_string_pretty(&resource.attributes)
                .map_err(|e| e.to_string())?;
            println!("{}", pretty);
            Ok(())
        }
        StateCommands::Rm { address } => {
            let (resource_type, name) = split_address(&address)?;
            let lock = backend
                .acquire_lock("state rm")
                .await
                .map_err(|e| e.to_string())?;

            let result = async {
                let mut state_file = load_state(backend).await?;
                if state_file.remove_resource(resource_type, name).is_none() {
                    return Err(format!("No resource in state for {}", address));
                }
                state_file.increment_serial();
                backend
                    .write_state(&state_file)
                    .await
                    .map_err(|e| e.to_string())?;
                println!("{}", format!("Removed {} from state.", address).green());
                Ok(())
            }
            .await;

            release(backend, &lock).await;
            result
        }
    }
}

async fn run_force_unlock(lock_id: &str, backend: &LocalBackend) -> Result<(), String> {
    backend
        .force_unlock(lock_id)
        .await
        .map_err(|e| e.to_string())?;
    println!("{}", "Lock released.".green());
    Ok(())
}

async fn release(backend: &LocalBackend, lock: &LockInfo) {
    if let Err(e) = backend.release_lock(lock).await {
        eprintln!(
            "{} failed to release lock {}: {}",
            "Warning:".yellow().bold(),
            lock.id,
            e
        );
    }
}

/// Split "dlc.data_engine.main" into ("dlc.data_engine", "main")
fn split_address(address: &str) -> Result<(&str, &str), String> {
    address
        .rsplit_once('.')
        .filter(|(resource_type, name)| !resource_type.is_empty() && !name.is_empty())
        .ok_or_else(|| format!("Invalid resource address: {}", address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemas_cover_all_resource_types() {
        let schemas = get_schemas();
        assert!(schemas.contains_key("dlc.data_engine"));
        assert!(schemas.contains_key("dlc.work_group"));
        assert!(schemas.contains_key("dlc.data_engines"));
    }

    #[test]
    fn validates_known_resources() {
        let resources = manifest::parse(
            r#"{
                "resources": [{
                    "type": "dlc.work_group",
                    "name": "analysts",
                    "attributes": { "work_group_name": "analysts" }
                }]
            }"#,
        )
        .unwrap();
        assert!(validate_resources(&resources).is_ok());
    }

    #[test]
    fn rejects_unknown_resource_type() {
        let resources = manifest::parse(
            r#"{ "resources": [{ "type": "dlc.nonsense", "name": "x", "attributes": {} }] }"#,
        )
        .unwrap();
        let err = validate_resources(&resources).unwrap_err();
        assert!(err.contains("unknown resource type"));
    }

    #[test]
    fn splits_addresses() {
        assert_eq!(
            split_address("dlc.data_engine.main").unwrap(),
            ("dlc.data_engine", "main")
        );
        assert!(split_address("nodots").is_err());
    }

    #[test]
    fn orphan_deletes_come_from_state() {
        let mut state_file = StateFile::new();
        state_file.upsert_resource(ResourceState::new("dlc.user", "gone", "dlc"));

        let mut plan = Plan::new();
        append_orphan_deletes(&mut plan, &[], &state_file);

        assert_eq!(plan.effects().len(), 1);
        assert!(matches!(plan.effects()[0], Effect::Delete(_)));
    }
}
