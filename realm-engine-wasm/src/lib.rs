//! WASM bindings for realm-engine. Each browser tab constructs one
//! `RealmTab`; tabs find each other over a `BroadcastChannel`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Once;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{BroadcastChannel, MessageEvent};

use realm_engine::core::channel::{ChannelError, Transport};
use realm_engine::schema::player::{AVATAR_OPTIONS, CLASS_OPTIONS, COLOR_OPTIONS};
use realm_engine::{CharacterSheet, RealmEngine};

static INIT: Once = Once::new();

fn init_hooks() {
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    });
}

fn to_js<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// BroadcastTransport: the browser's same-origin broadcast channel
// ---------------------------------------------------------------------------

/// Browsers never deliver a tab's own posts back to it, so no origin
/// filtering is needed here.
struct BroadcastTransport {
    channel: Option<BroadcastChannel>,
    inbox: Rc<RefCell<VecDeque<String>>>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
}

impl BroadcastTransport {
    fn open(name: &str) -> Result<Self, JsValue> {
        let channel = BroadcastChannel::new(name)?;
        let inbox: Rc<RefCell<VecDeque<String>>> = Rc::new(RefCell::new(VecDeque::new()));

        let sink = Rc::clone(&inbox);
        let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            match event.data().as_string() {
                Some(frame) => sink.borrow_mut().push_back(frame),
                None => tracing::warn!("dropping non-string broadcast frame"),
            }
        });
        channel.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        Ok(Self {
            channel: Some(channel),
            inbox,
            _on_message: on_message,
        })
    }
}

impl Transport for BroadcastTransport {
    fn post(&mut self, frame: &str) -> Result<(), ChannelError> {
        let channel = self.channel.as_ref().ok_or(ChannelError::Closed)?;
        channel
            .post_message(&JsValue::from_str(frame))
            .map_err(|e| ChannelError::Transport(format!("{e:?}")))
    }

    fn try_recv(&mut self) -> Option<String> {
        self.inbox.borrow_mut().pop_front()
    }

    fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.set_onmessage(None);
            channel.close();
        }
        self.inbox.borrow_mut().clear();
    }
}

// ---------------------------------------------------------------------------
// RealmTab: the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct RealmTab {
    engine: RealmEngine,
}

#[wasm_bindgen]
impl RealmTab {
    /// Join the named channel. Sends the initial sync request right away;
    /// call `pump` to pick up peers' answers.
    #[wasm_bindgen(constructor)]
    pub fn new(channel: &str, seed: Option<u64>) -> Result<RealmTab, JsError> {
        init_hooks();

        let transport = BroadcastTransport::open(channel)
            .map_err(|e| JsError::new(&format!("BroadcastChannel error: {e:?}")))?;

        let mut builder = RealmEngine::builder().channel_name(channel);
        if let Some(seed) = seed {
            builder = builder.seed(seed);
        }
        let engine = builder
            .build(transport)
            .map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;

        Ok(RealmTab { engine })
    }

    /// JSON object of the character-creation choices.
    pub fn options() -> String {
        serde_json::json!({
            "avatars": AVATAR_OPTIONS,
            "classes": CLASS_OPTIONS,
            "colors": COLOR_OPTIONS,
        })
        .to_string()
    }

    /// Create this tab's character. Returns the player as JSON.
    #[wasm_bindgen(js_name = createCharacter)]
    pub fn create_character(
        &mut self,
        name: &str,
        avatar: &str,
        class: &str,
        color: &str,
    ) -> Result<String, JsError> {
        let sheet = CharacterSheet::new(name)
            .with_avatar(avatar)
            .with_class(class)
            .with_color(color);
        let player = self
            .engine
            .create_character(sheet)
            .map_err(|e| JsError::new(&e.to_string()))?;
        to_js(player)
    }

    /// Run one line of input. Returns how many messages were appended.
    pub fn submit(&mut self, line: &str) -> Result<usize, JsError> {
        self.engine
            .submit(line)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Apply waiting channel traffic. Returns how many frames were applied.
    pub fn pump(&mut self) -> usize {
        self.engine.pump()
    }

    /// Total number of messages in this tab's log.
    #[wasm_bindgen(js_name = messageCount)]
    pub fn message_count(&self) -> usize {
        self.engine.messages().len()
    }

    /// JSON array of the messages after `cursor`.
    #[wasm_bindgen(js_name = messagesSince)]
    pub fn messages_since(&self, cursor: usize) -> Result<String, JsError> {
        to_js(self.engine.messages().since(cursor))
    }

    /// The local player as JSON, or `null` before character creation.
    pub fn player(&self) -> Result<String, JsError> {
        to_js(&self.engine.player())
    }

    /// JSON array of every known player, local first.
    pub fn roster(&self) -> Result<String, JsError> {
        to_js(&self.engine.roster())
    }

    /// Announce departure and close the channel. Call from `beforeunload`.
    pub fn leave(&mut self) {
        self.engine.leave();
    }
}
