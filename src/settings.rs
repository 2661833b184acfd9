use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub messenger: MessengerSettings,
    pub data: DataSettings,
    pub dialogue: DialogueSettings,
    pub notify: NotifySettings,
}

impl Settings {
    pub fn load(name: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(name).required(false))
            .add_source(config::Environment::with_prefix("AILZA").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub webhook_path: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            webhook_path: "/webhook".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MessengerSettings {
    pub verify_token: String,
    pub page_access_token: String,
    pub graph_api_url: String,
    pub max_quick_replies: usize,
    pub quick_reply_title_max: usize,
}

impl Default for MessengerSettings {
    fn default() -> Self {
        Self {
            verify_token: String::new(),
            page_access_token: String::new(),
            graph_api_url: "https://graph.facebook.com/v18.0".to_string(),
            max_quick_replies: 11,
            quick_reply_title_max: 20,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DataSettings {
    pub knowledge_base_file: String,
    pub store_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            knowledge_base_file: "data/knowledge_base.json".to_string(),
            store_dir: "store".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DialogueSettings {
    pub reply_delay_ms: u64,
    pub reprompt_delay_ms: u64,
    pub log_exempt_answers: Vec<String>,
    pub error_notice: String,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            reply_delay_ms: 500,
            reprompt_delay_ms: 500,
            log_exempt_answers: Vec::new(),
            error_notice: "Sorry, something went wrong on our side. Please try again in a moment."
                .to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct NotifySettings {
    pub complaint_address: Option<String>,
    pub feedback_address: Option<String>,
    pub from_address: String,
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
}
