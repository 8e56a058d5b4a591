use std::{sync::Arc, time::Duration};

use tokio::runtime::Handle;

use crate::{
    Config, NodeManager, NodeherdError, Result, StoreType,
    driver::RuntimeDriver,
    events::{Channel, Notifier},
    migrate::{ConfigMigrator, ControllerConfigMigrator},
    ports::PortChecker,
    registry::SpecRegistry,
    store::{MemStore, NodeStore, PostgresStore},
};

/// Assembles a [`NodeManager`] from its collaborators.
///
/// The driver and registry are required. The store defaults to the one the
/// config names, the migrator to [`ControllerConfigMigrator`], the notifier to
/// the manager's event channel and the runtime to the current tokio runtime.
#[derive(Default)]
pub struct ManagerBuilder {
    config: Config,
    store: Option<Arc<dyn NodeStore>>,
    driver: Option<Arc<dyn RuntimeDriver>>,
    registry: Option<Arc<dyn SpecRegistry>>,
    migrator: Option<Arc<dyn ConfigMigrator>>,
    notifier: Option<Arc<dyn Notifier>>,
    port_checker: Option<Arc<dyn PortChecker>>,
    port_check_delay: Option<Duration>,
    rt: Option<Handle>,
}

impl ManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn store(
        mut self,
        store: Arc<dyn NodeStore>,
    ) -> Self {
        self.store = Some(store);
        self
    }

    pub fn driver(
        mut self,
        driver: Arc<dyn RuntimeDriver>,
    ) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn registry(
        mut self,
        registry: Arc<dyn SpecRegistry>,
    ) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn migrator(
        mut self,
        migrator: Arc<dyn ConfigMigrator>,
    ) -> Self {
        self.migrator = Some(migrator);
        self
    }

    pub fn notifier(
        mut self,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn port_checker(
        mut self,
        port_checker: Arc<dyn PortChecker>,
    ) -> Self {
        self.port_checker = Some(port_checker);
        self
    }

    /// Overrides `port_check_delay_secs` from the config.
    pub fn port_check_delay(
        mut self,
        delay: Duration,
    ) -> Self {
        self.port_check_delay = Some(delay);
        self
    }

    pub fn runtime(
        mut self,
        runtime: Handle,
    ) -> Self {
        self.rt = Some(runtime);
        self
    }

    pub fn build(self) -> Result<NodeManager> {
        let runtime = match self.rt {
            Some(rt) => rt,
            None => Handle::try_current().map_err(|e| NodeherdError::Engine(format!("a tokio runtime is required: {}", e)))?,
        };
        let driver = self.driver.ok_or_else(|| NodeherdError::Engine("a runtime driver is required".to_string()))?;
        let registry = self.registry.ok_or_else(|| NodeherdError::Engine("a spec registry is required".to_string()))?;

        let store: Arc<dyn NodeStore> = match self.store {
            Some(store) => store,
            None => match self.config.store.store_type {
                StoreType::Mem => Arc::new(MemStore::new()),
                StoreType::Postgres => {
                    let postgres = self
                        .config
                        .store
                        .postgres
                        .as_ref()
                        .ok_or_else(|| NodeherdError::Config("postgres configuration is required when store type is postgres".to_string()))?;
                    Arc::new(PostgresStore::new(&postgres.database_url, runtime.clone())?)
                }
            },
        };

        let channel = Arc::new(Channel::new(runtime.clone()));
        let notifier = self.notifier.unwrap_or_else(|| channel.clone() as Arc<dyn Notifier>);
        let migrator = self.migrator.unwrap_or_else(|| Arc::new(ControllerConfigMigrator) as Arc<dyn ConfigMigrator>);
        let port_check_delay = self.port_check_delay.unwrap_or_else(|| self.config.port_check_delay());

        Ok(NodeManager::new(
            self.config,
            store,
            driver,
            registry,
            migrator,
            notifier,
            self.port_checker,
            channel,
            port_check_delay,
            runtime,
        ))
    }
}
