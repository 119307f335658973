use clap::Args;
use padlock_system::OidcParams;
use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Args, Debug)]
pub struct Server {
    /// YAML configuration file
    #[arg(short, long, env = "PADLOCK_CONFIG")]
    config: String,

    /// OIDC issuer parameter file (JSON); overrides any inline issuer
    /// configuration
    #[arg(long, env = "PADLOCK_OIDC_PARAMS")]
    oidc: Option<String>,
}

impl Server {
    pub async fn handle(self) {
        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(fmt::layer())
            .with(ErrorLayer::default())
            .init();

        let raw = std::fs::read_to_string(&self.config)
            .unwrap_or_else(|err| panic!("unable to read `{}`: {err}", self.config));
        let mut config: padlock_system::Config =
            serde_yaml::from_str(&raw).expect("configuration file does not parse");

        if let Some(path) = self.oidc.as_deref() {
            let raw = std::fs::read_to_string(path)
                .unwrap_or_else(|err| panic!("unable to read `{path}`: {err}"));
            let params: OidcParams =
                serde_json::from_str(&raw).expect("OIDC parameter file does not parse");
            if let Some(section) = config.authenticate.as_mut() {
                section.oidc = Some(params);
            }
        }

        padlock_system::start(config, padlock_system::shutdown_signal())
            .await
            .unwrap()
    }
}
