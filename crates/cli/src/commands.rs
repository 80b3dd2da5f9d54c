use clap::Subcommand;
use eyre::WrapErr;
use regstore_core::{is_reserved, Error, Value, REGISTRY_WILDCARD};
use regstore_store::{PhysicalBackend, RegisteredStore};
use regstore_utils::tracing::operation_span;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a JSON value under a new id
    Create {
        id: String,
        /// Value as JSON
        value: String,
    },

    /// Print the value stored under an id
    Read { id: String },

    /// Replace the value stored under an id
    Update {
        id: String,
        /// Value as JSON
        value: String,
    },

    /// Delete the value stored under an id
    Delete { id: String },

    /// Show registry data for an id
    Info {
        id: String,
        /// Single field to show (storageId, safeId, classification,
        /// storageDirectory, storageExtension, modified)
        #[arg(long, default_value = REGISTRY_WILDCARD)]
        field: String,
    },

    /// List every registered id
    List,

    /// Compare the registry with the stored records
    Verify {
        /// Drop registry entries whose record is missing
        #[arg(long)]
        prune: bool,
    },
}

impl Commands {
    /// Run the command; `Ok(false)` when the store reported failure
    pub fn execute<B: PhysicalBackend>(
        self,
        store: &mut RegisteredStore<B>,
    ) -> eyre::Result<bool> {
        match self {
            Commands::Create { id, value } => {
                let _span = operation_span("create", &id).entered();
                let value = parse_value(&value)?;
                guard_reserved(&id)?;
                Ok(store.create(&id, &value))
            }
            Commands::Read { id } => {
                let _span = operation_span("read", &id).entered();
                let value = store.read(&id);
                println!("{}", render(value.clone())?);
                Ok(!value.is_false())
            }
            Commands::Update { id, value } => {
                let _span = operation_span("update", &id).entered();
                let value = parse_value(&value)?;
                guard_reserved(&id)?;
                Ok(store.update(&id, &value))
            }
            Commands::Delete { id } => {
                let _span = operation_span("delete", &id).entered();
                guard_reserved(&id)?;
                Ok(store.delete(&id))
            }
            Commands::Info { id, field } => {
                let data = if field == REGISTRY_WILDCARD {
                    store.get_registry_entry(&id)
                } else {
                    store.get_registry_data(&id, &field)
                };
                println!("{}", render(data.clone())?);
                Ok(!data.is_false())
            }
            Commands::List => {
                let registry = store.get_registry();
                println!("{}", serde_json::to_string_pretty(&registry)?);
                Ok(true)
            }
            Commands::Verify { prune } => {
                let report = store.verify()?;
                println!("{report}");
                if !prune {
                    return Ok(report.is_consistent());
                }
                let removed = store.prune_dangling()?;
                println!("pruned {removed} dangling entries");
                // Orphans and key mismatches need an operator
                store
                    .verify()?
                    .ensure_consistent()
                    .wrap_err("registry still inconsistent after pruning")?;
                Ok(true)
            }
        }
    }
}

fn parse_value(raw: &str) -> eyre::Result<Value> {
    let json: serde_json::Value =
        serde_json::from_str(raw).wrap_err_with(|| format!("value is not valid JSON: {raw}"))?;
    Ok(Value::from(json))
}

fn guard_reserved(id: &str) -> Result<(), Error> {
    if is_reserved(id) {
        return Err(Error::reserved_id(id));
    }
    Ok(())
}

fn render(value: Value) -> eyre::Result<String> {
    Ok(serde_json::to_string_pretty(&serde_json::Value::from(value))?)
}
