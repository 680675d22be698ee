//! Message dispatch: rate-limit gate, command routing, AI auto-reply.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::bot::fun::FunClient;
use crate::bot::gateway::{Gateway, Presence};
use crate::bot::memory::{ConversationMemory, Role};
use crate::bot::message::{parse_command, Command, InboundMessage};
use crate::bot::providers::AiChain;
use crate::bot::ratelimit::RateLimiter;
use crate::bot::registry::UserRegistry;
use crate::bot::util::{format_bytes, format_uptime, process_rss_bytes};
use crate::config::Config;

/// Grace period before the restart command exits the process, so the
/// confirmation reply has time to go out.
const RESTART_DELAY: Duration = Duration::from_secs(1);

/// Interval for the background sweep of rate windows and transcripts.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// The bot engine. Holds all mutable state behind mutexes; locks are never
/// held across an await so concurrent handlers see atomic read-modify-write
/// updates per map.
pub struct BotEngine<G: Gateway> {
    config: Arc<Config>,
    gateway: Arc<G>,
    chain: AiChain,
    fun: FunClient,
    limiter: Mutex<RateLimiter>,
    memory: Mutex<ConversationMemory>,
    registry: Mutex<UserRegistry>,
    started: Instant,
}

impl<G: Gateway + 'static> BotEngine<G> {
    pub fn new(config: Arc<Config>, gateway: Arc<G>) -> Self {
        let registry = UserRegistry::load_or_new(&config.data_dir.join("database.json"));
        Self::with_registry(config, gateway, registry)
    }

    pub fn with_registry(config: Arc<Config>, gateway: Arc<G>, registry: UserRegistry) -> Self {
        let chain = AiChain::new(config.providers.clone());
        let limiter = RateLimiter::new(config.anti_ban, config.max_msgs_per_minute);

        Self {
            config,
            gateway,
            chain,
            fun: FunClient::new(),
            limiter: Mutex::new(limiter),
            memory: Mutex::new(ConversationMemory::new()),
            registry: Mutex::new(registry),
            started: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Spawn the periodic sweep of stale rate windows and expired
    /// transcripts.
    pub fn start_sweeper(self: &Arc<Self>) {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let now = Instant::now();
                let windows = engine.limiter.lock().await.sweep(now);
                let transcripts = engine.memory.lock().await.sweep(now);
                if windows + transcripts > 0 {
                    debug!("Swept {windows} rate window(s), {transcripts} transcript(s)");
                }
            }
        });
    }

    /// Entry point for one inbound message. Group chats are unconditionally
    /// ignored; any error below is logged and swallowed here so one
    /// message's failure never affects other senders.
    pub async fn handle_event(&self, msg: InboundMessage) {
        if msg.is_group() {
            debug!("Ignoring group message from {}", msg.chat_id);
            return;
        }
        if msg.text.is_empty() {
            return;
        }

        let preview: String = msg.text.chars().take(80).collect();
        info!("📨 {} ({}): {:?}", msg.push_name, msg.sender_number(), preview);

        if let Err(e) = self.dispatch(&msg).await {
            error!("Message handling failed: {e}");
        }
    }

    async fn dispatch(&self, msg: &InboundMessage) -> Result<(), String> {
        let sender = msg.sender_number().to_string();

        {
            let mut limiter = self.limiter.lock().await;
            if !limiter.admit(&msg.sender, Instant::now()) {
                // Silent drop: no reply of any kind
                debug!("Rate limited {sender}, dropping message");
                return Ok(());
            }
        }

        {
            let mut registry = self.registry.lock().await;
            if registry.is_blocked(&sender) {
                debug!("Sender {sender} is blocked, dropping message");
                return Ok(());
            }
            if let Err(e) = registry.add_user(&sender, &msg.push_name) {
                warn!("Failed to record user: {e}");
            }
        }

        if self.config.anti_ban && self.config.msg_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.msg_delay_ms)).await;
        }

        if self.config.auto_read {
            if let Err(e) = self.gateway.mark_read(&msg.chat_id, &msg.message_id).await {
                warn!("mark_read failed: {e}");
            }
        }
        if self.config.auto_typing {
            self.set_presence(msg, Presence::Composing).await;
        }

        let result = match parse_command(&msg.text, &self.config.prefix) {
            Some(cmd) => self.dispatch_command(msg, &sender, cmd).await,
            None => self.auto_reply(msg, &sender).await,
        };

        if self.config.auto_typing {
            self.set_presence(msg, Presence::Paused).await;
        }

        result
    }

    async fn dispatch_command(
        &self,
        msg: &InboundMessage,
        sender: &str,
        cmd: Command,
    ) -> Result<(), String> {
        info!("Command '{}' from {sender}", cmd.name);

        match cmd.name.as_str() {
            "menu" | "help" | "commands" => self.cmd_menu(msg).await,
            "ping" => self.cmd_ping(msg).await,
            "alive" => self.cmd_alive(msg).await,
            "status" => self.cmd_status(msg).await,
            "ai" | "chat" => self.cmd_ai(msg, sender, &cmd.args).await,
            "owner" => self.cmd_owner(msg).await,
            "channel" => self.cmd_channel(msg).await,
            "joke" => {
                let fetched = self.fun.joke().await;
                self.cmd_fun(msg, fetched, "❌ Error fetching joke!").await
            }
            "quote" => {
                let fetched = self.fun.quote().await;
                self.cmd_fun(msg, fetched, "❌ Error fetching quote!").await
            }
            "fact" => {
                let fetched = self.fun.fact().await;
                self.cmd_fun(msg, fetched, "❌ Error fetching fact!").await
            }
            "advice" => {
                let fetched = self.fun.advice().await;
                self.cmd_fun(msg, fetched, "❌ Error fetching advice!").await
            }
            "restart" => self.cmd_restart(msg, sender).await,
            other => {
                debug!("Unknown command '{other}', ignoring");
                Ok(())
            }
        }
    }

    async fn cmd_menu(&self, msg: &InboundMessage) -> Result<(), String> {
        let p = &self.config.prefix;
        let ai_state = if self.config.ai_auto_reply { "ON ✅" } else { "OFF" };
        let menu = format!(
            "╭━━━『 MENU 』━━━╮\n\
             ┃\n\
             ┃ 👋 Hi {}!\n\
             ┃\n\
             ┃ 🤖 {}\n\
             ┃ 👤 {}\n\
             ┃ ⚡ {}\n\
             ┃ 🧠 AI: {}\n\
             ┃\n\
             ╰━━━━━━━━━━━━━━╯\n\n\
             ╭━━━『 🏠 MAIN 』━━━╮\n\
             ┃ {p}menu\n\
             ┃ {p}ping\n\
             ┃ {p}alive\n\
             ┃ {p}owner\n\
             ┃ {p}channel\n\
             ┃ {p}status\n\
             ╰━━━━━━━━━━━━━━╯\n\n\
             ╭━━━『 🧠 AI 』━━━╮\n\
             ┃ {p}ai <text>\n\
             ┃ {p}chat <text>\n\
             ┃\n\
             ┃ 💡 Just chat with me!\n\
             ╰━━━━━━━━━━━━━━╯\n\n\
             ╭━━━『 🎮 FUN 』━━━╮\n\
             ┃ {p}joke\n\
             ┃ {p}quote\n\
             ┃ {p}fact\n\
             ┃ {p}advice\n\
             ╰━━━━━━━━━━━━━━╯\n\n\
             📢 {}",
            msg.push_name,
            self.config.bot_name,
            self.config.owner_name,
            p,
            ai_state,
            self.config.channel_link,
        );

        self.reply_image(msg, &menu).await
    }

    async fn cmd_ping(&self, msg: &InboundMessage) -> Result<(), String> {
        let start = Instant::now();
        let sent_id = self.reply(msg, "⚡ Pinging...").await?;
        let latency_ms = start.elapsed().as_millis();

        self.gateway
            .edit_text(
                &msg.chat_id,
                &sent_id,
                &self.branded(&format!("🏓 Pong!\n⚡ {latency_ms}ms")),
            )
            .await
    }

    async fn cmd_alive(&self, msg: &InboundMessage) -> Result<(), String> {
        let caption = format!(
            "✅ I'm Alive!\n\n⏱️ Uptime: {}\n🧠 AI: Active\n📡 Status: Online 24/7",
            format_uptime(self.uptime()),
        );
        self.reply_image(msg, &caption).await
    }

    async fn cmd_status(&self, msg: &InboundMessage) -> Result<(), String> {
        let ai_state = if self.config.ai_auto_reply { "Active" } else { "Inactive" };
        let mut status = format!(
            "📊 Status:\n\n⏱️ Uptime: {}\n🧠 AI: {ai_state}",
            format_uptime(self.uptime()),
        );
        if let Some(rss) = process_rss_bytes() {
            status.push_str(&format!("\n💾 Memory: {}", format_bytes(rss)));
        }
        status.push_str("\n✅ Status: Online 24/7");

        self.reply(msg, &status).await?;
        Ok(())
    }

    async fn cmd_ai(&self, msg: &InboundMessage, sender: &str, args: &str) -> Result<(), String> {
        if !self.config.ai_enabled {
            self.reply(msg, "🧠 AI is currently disabled.").await?;
            return Ok(());
        }
        if args.is_empty() {
            let usage = format!("❌ Provide text!\n\nExample: {}ai Hello", self.config.prefix);
            self.reply(msg, &usage).await?;
            return Ok(());
        }

        self.set_presence(msg, Presence::Composing).await;
        self.typing_delay().await;

        let answer = self.chat_reply(sender, args).await;
        self.reply(msg, &format!("🧠 AI:\n\n{answer}")).await?;
        Ok(())
    }

    async fn cmd_owner(&self, msg: &InboundMessage) -> Result<(), String> {
        if let Err(e) = self
            .gateway
            .send_contact(&msg.chat_id, &self.config.owner_name, &self.config.owner_number)
            .await
        {
            warn!("send_contact failed: {e}");
        }

        let text = format!(
            "👤 Owner: {}\n📞 +{}",
            self.config.owner_name, self.config.owner_number,
        );
        self.reply(msg, &text).await?;
        Ok(())
    }

    async fn cmd_channel(&self, msg: &InboundMessage) -> Result<(), String> {
        let text = format!(
            "📢 Join Channel!\n\n{}\n\nStay updated! 🚀",
            self.config.channel_link,
        );
        self.reply(msg, &text).await?;
        Ok(())
    }

    /// Relay one fetched item, or the handler's apology line if the
    /// endpoint failed. Endpoint failures never propagate.
    async fn cmd_fun(
        &self,
        msg: &InboundMessage,
        fetched: Result<String, String>,
        apology: &str,
    ) -> Result<(), String> {
        match fetched {
            Ok(text) => self.reply(msg, &text).await?,
            Err(e) => {
                warn!("Fun endpoint failed: {e}");
                self.reply(msg, apology).await?
            }
        };
        Ok(())
    }

    async fn cmd_restart(&self, msg: &InboundMessage, sender: &str) -> Result<(), String> {
        if !self.config.is_owner(sender) {
            self.reply(msg, "❌ This command is owner-only.").await?;
            return Ok(());
        }

        self.reply(msg, "♻️ Restarting...").await?;
        info!("Restart requested by owner, exiting in {:?}", RESTART_DELAY);
        tokio::spawn(async {
            tokio::time::sleep(RESTART_DELAY).await;
            std::process::exit(0);
        });
        Ok(())
    }

    /// Default branch: relay free-form text to the AI chain.
    async fn auto_reply(&self, msg: &InboundMessage, sender: &str) -> Result<(), String> {
        if !self.config.ai_auto_reply || msg.text.chars().count() <= 1 {
            return Ok(());
        }

        self.set_presence(msg, Presence::Composing).await;
        self.typing_delay().await;

        let answer = self.chat_reply(sender, &msg.text).await;
        self.reply(msg, &answer).await?;
        Ok(())
    }

    /// Record the user turn, get a completion, record the assistant turn.
    /// The transcript is stored only; the request carries the raw text.
    async fn chat_reply(&self, sender: &str, text: &str) -> String {
        {
            let mut memory = self.memory.lock().await;
            memory.record(sender, Role::User, text, Instant::now());
        }

        let answer = self.chain.complete_text(text).await;

        {
            let mut memory = self.memory.lock().await;
            memory.record(sender, Role::Assistant, &answer, Instant::now());
        }
        answer
    }

    /// Every outbound reply carries the bot-name header and footer.
    fn branded(&self, body: &str) -> String {
        format!("{}\n\n{}\n\n{}", self.config.bot_name, body, self.config.footer)
    }

    async fn reply(&self, msg: &InboundMessage, body: &str) -> Result<String, String> {
        self.gateway.send_text(&msg.chat_id, &self.branded(body)).await
    }

    async fn reply_image(&self, msg: &InboundMessage, caption: &str) -> Result<(), String> {
        let caption = self.branded(caption);
        if self.config.profile_pic_url.is_empty() {
            self.gateway.send_text(&msg.chat_id, &caption).await?;
        } else {
            self.gateway
                .send_image(&msg.chat_id, &self.config.profile_pic_url, &caption)
                .await?;
        }
        Ok(())
    }

    async fn set_presence(&self, msg: &InboundMessage, presence: Presence) {
        if let Err(e) = self.gateway.set_presence(&msg.chat_id, presence).await {
            warn!("set_presence failed: {e}");
        }
    }

    async fn typing_delay(&self) {
        if self.config.typing_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.typing_delay_ms)).await;
        }
    }

    #[cfg(test)]
    async fn transcript_len(&self, sender: &str) -> usize {
        self.memory
            .lock()
            .await
            .turns(sender)
            .map(|t| t.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::providers::FALLBACK_REPLY;
    use std::path::PathBuf;
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Text { chat: String, text: String },
        Image { chat: String, caption: String },
        Edit { message_id: String, text: String },
        Contact { name: String, phone: String },
        Read { message_id: String },
        Presence(Presence),
    }

    /// Gateway fake that records every outbound operation.
    struct RecordingGateway {
        sent: StdMutex<Vec<Sent>>,
    }

    impl RecordingGateway {
        fn new() -> Self {
            Self { sent: StdMutex::new(Vec::new()) }
        }

        fn all(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn texts(&self) -> Vec<String> {
            self.all()
                .into_iter()
                .filter_map(|s| match s {
                    Sent::Text { text, .. } => Some(text),
                    _ => None,
                })
                .collect()
        }

        fn push(&self, sent: Sent) -> String {
            let mut log = self.sent.lock().unwrap();
            log.push(sent);
            format!("SENT-{}", log.len())
        }
    }

    impl Gateway for RecordingGateway {
        async fn send_text(&self, chat_id: &str, text: &str) -> Result<String, String> {
            Ok(self.push(Sent::Text { chat: chat_id.to_string(), text: text.to_string() }))
        }

        async fn send_image(
            &self,
            chat_id: &str,
            _image_url: &str,
            caption: &str,
        ) -> Result<String, String> {
            Ok(self.push(Sent::Image {
                chat: chat_id.to_string(),
                caption: caption.to_string(),
            }))
        }

        async fn edit_text(
            &self,
            _chat_id: &str,
            message_id: &str,
            text: &str,
        ) -> Result<(), String> {
            self.push(Sent::Edit {
                message_id: message_id.to_string(),
                text: text.to_string(),
            });
            Ok(())
        }

        async fn send_contact(
            &self,
            _chat_id: &str,
            display_name: &str,
            phone_number: &str,
        ) -> Result<String, String> {
            Ok(self.push(Sent::Contact {
                name: display_name.to_string(),
                phone: phone_number.to_string(),
            }))
        }

        async fn mark_read(&self, _chat_id: &str, message_id: &str) -> Result<(), String> {
            self.push(Sent::Read { message_id: message_id.to_string() });
            Ok(())
        }

        async fn set_presence(&self, _chat_id: &str, presence: Presence) -> Result<(), String> {
            self.push(Sent::Presence(presence));
            Ok(())
        }
    }

    fn test_config() -> Config {
        Config {
            bot_name: "TestBot".to_string(),
            owner_name: "Owner".to_string(),
            owner_number: "94726962984".to_string(),
            prefix: ".".to_string(),
            bridge_url: "http://localhost:0".to_string(),
            ai_enabled: true,
            ai_auto_reply: true,
            channel_link: "https://whatsapp.com/channel/test".to_string(),
            profile_pic_url: "https://example.test/pic.jpg".to_string(),
            footer: "© TestBot 2024".to_string(),
            anti_ban: true,
            msg_delay_ms: 0,
            max_msgs_per_minute: 15,
            typing_delay_ms: 0,
            auto_read: true,
            auto_typing: true,
            always_online: true,
            port: 0,
            data_dir: PathBuf::from("."),
            providers: Vec::new(),
        }
    }

    fn make_engine(config: Config) -> (BotEngine<RecordingGateway>, Arc<RecordingGateway>) {
        let gateway = Arc::new(RecordingGateway::new());
        let engine = BotEngine::with_registry(
            Arc::new(config),
            gateway.clone(),
            UserRegistry::new(),
        );
        (engine, gateway)
    }

    fn dm(text: &str) -> InboundMessage {
        InboundMessage {
            message_id: "MID-1".to_string(),
            chat_id: "94711111111@s.whatsapp.net".to_string(),
            sender: "94711111111@s.whatsapp.net".to_string(),
            push_name: "Alice".to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_group_messages_never_dispatched() {
        let (engine, gateway) = make_engine(test_config());
        let mut msg = dm(".ping");
        msg.chat_id = "1234567-89@g.us".to_string();

        engine.handle_event(msg).await;
        assert!(gateway.all().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_messages_dropped_silently() {
        let mut config = test_config();
        config.max_msgs_per_minute = 1;
        let (engine, gateway) = make_engine(config);

        engine.handle_event(dm("hello there")).await;
        let after_first = gateway.texts().len();
        assert_eq!(after_first, 1);

        engine.handle_event(dm("hello again")).await;
        // Second message dropped: no reply, no read, no presence
        assert_eq!(gateway.texts().len(), after_first);
        let reads = gateway
            .all()
            .iter()
            .filter(|s| matches!(s, Sent::Read { .. }))
            .count();
        assert_eq!(reads, 1);
    }

    #[tokio::test]
    async fn test_auto_reply_is_branded_and_uses_fallback() {
        let (engine, gateway) = make_engine(test_config());
        engine.handle_event(dm("hello there")).await;

        let texts = gateway.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("TestBot\n\n"));
        assert!(texts[0].contains(FALLBACK_REPLY));
        assert!(texts[0].ends_with("© TestBot 2024"));
    }

    #[tokio::test]
    async fn test_auto_reply_records_both_turns() {
        let (engine, _gateway) = make_engine(test_config());
        engine.handle_event(dm("hello there")).await;
        assert_eq!(engine.transcript_len("94711111111").await, 2);
    }

    #[tokio::test]
    async fn test_single_char_text_gets_no_auto_reply() {
        let (engine, gateway) = make_engine(test_config());
        engine.handle_event(dm("k")).await;
        assert!(gateway.texts().is_empty());
    }

    #[tokio::test]
    async fn test_auto_reply_disabled() {
        let mut config = test_config();
        config.ai_auto_reply = false;
        let (engine, gateway) = make_engine(config);

        engine.handle_event(dm("hello there")).await;
        assert!(gateway.texts().is_empty());
        assert_eq!(engine.transcript_len("94711111111").await, 0);
    }

    #[tokio::test]
    async fn test_ping_sends_then_edits() {
        let (engine, gateway) = make_engine(test_config());
        engine.handle_event(dm(".ping")).await;

        let texts = gateway.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("Pinging"));

        let edit = gateway
            .all()
            .into_iter()
            .find_map(|s| match s {
                Sent::Edit { message_id, text } => Some((message_id, text)),
                _ => None,
            })
            .expect("ping should edit the probe message");
        assert_eq!(edit.0, "SENT-3"); // read, composing, then the probe
        assert!(edit.1.contains("Pong"));
    }

    #[tokio::test]
    async fn test_menu_aliases_send_image_with_command_list() {
        for alias in [".menu", ".help", ".commands"] {
            let (engine, gateway) = make_engine(test_config());
            engine.handle_event(dm(alias)).await;

            let caption = gateway
                .all()
                .into_iter()
                .find_map(|s| match s {
                    Sent::Image { caption, .. } => Some(caption),
                    _ => None,
                })
                .unwrap_or_else(|| panic!("{alias} should send the menu image"));
            assert!(caption.contains(".ping"));
            assert!(caption.contains("Hi Alice"));
            assert!(caption.contains("TestBot"));
        }
    }

    #[tokio::test]
    async fn test_ai_command_without_args_replies_usage() {
        let (engine, gateway) = make_engine(test_config());
        engine.handle_event(dm(".ai")).await;

        let texts = gateway.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("Provide text"));
        assert_eq!(engine.transcript_len("94711111111").await, 0);
    }

    #[tokio::test]
    async fn test_ai_command_routes_through_memory() {
        let (engine, gateway) = make_engine(test_config());
        engine.handle_event(dm(".ai hello there")).await;

        let texts = gateway.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("🧠 AI:"));
        assert!(texts[0].contains(FALLBACK_REPLY));
        assert_eq!(engine.transcript_len("94711111111").await, 2);
    }

    #[tokio::test]
    async fn test_owner_command_sends_contact_card() {
        let (engine, gateway) = make_engine(test_config());
        engine.handle_event(dm(".owner")).await;

        let contact = gateway
            .all()
            .into_iter()
            .find_map(|s| match s {
                Sent::Contact { name, phone } => Some((name, phone)),
                _ => None,
            })
            .expect("owner command should send a contact card");
        assert_eq!(contact.0, "Owner");
        assert_eq!(contact.1, "94726962984");
        assert!(gateway.texts()[0].contains("+94726962984"));
    }

    #[tokio::test]
    async fn test_channel_command_replies_link() {
        let (engine, gateway) = make_engine(test_config());
        engine.handle_event(dm(".channel")).await;
        assert!(gateway.texts()[0].contains("https://whatsapp.com/channel/test"));
    }

    #[tokio::test]
    async fn test_restart_rejected_for_non_owner() {
        let (engine, gateway) = make_engine(test_config());
        engine.handle_event(dm(".restart")).await;

        let texts = gateway.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("owner-only"));
    }

    #[tokio::test]
    async fn test_blocked_sender_is_dropped() {
        let gateway = Arc::new(RecordingGateway::new());
        let mut registry = UserRegistry::new();
        registry.block("94711111111");
        let engine = BotEngine::with_registry(Arc::new(test_config()), gateway.clone(), registry);

        engine.handle_event(dm("hello there")).await;
        assert!(gateway.all().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_gets_no_reply() {
        let (engine, gateway) = make_engine(test_config());
        engine.handle_event(dm(".frobnicate")).await;
        assert!(gateway.texts().is_empty());
    }

    #[tokio::test]
    async fn test_presence_lifecycle_around_command() {
        let (engine, gateway) = make_engine(test_config());
        engine.handle_event(dm(".status")).await;

        let presences: Vec<Presence> = gateway
            .all()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Presence(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(presences.first(), Some(&Presence::Composing));
        assert_eq!(presences.last(), Some(&Presence::Paused));
    }

    #[tokio::test]
    async fn test_auto_read_marks_message() {
        let (engine, gateway) = make_engine(test_config());
        engine.handle_event(dm(".status")).await;

        let read = gateway.all().into_iter().find_map(|s| match s {
            Sent::Read { message_id } => Some(message_id),
            _ => None,
        });
        assert_eq!(read.as_deref(), Some("MID-1"));
    }

    #[tokio::test]
    async fn test_status_reports_uptime() {
        let (engine, gateway) = make_engine(test_config());
        engine.handle_event(dm(".status")).await;
        let texts = gateway.texts();
        assert!(texts[0].contains("Uptime:"));
    }

    #[tokio::test]
    async fn test_menu_falls_back_to_text_without_picture() {
        let mut config = test_config();
        config.profile_pic_url = String::new();
        let (engine, gateway) = make_engine(config);

        engine.handle_event(dm(".menu")).await;
        assert!(gateway.texts()[0].contains(".ping"));
    }
}
