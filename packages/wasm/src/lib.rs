//! WebAssembly bindings for the ICP agent bridge.
//!
//! Exports one class, [`IcpAgent`], whose methods are the bridge operations.
//! The host hands in the `@dfinity` modules it already loaded; nothing is
//! attached to `window`. Compile with `wasm-pack build` to get an npm-ready
//! package.
//!
//! ```js
//! import init, { IcpAgent } from './icp_bridge_wasm.js';
//! import * as agent from '@dfinity/agent';
//! import * as identity from '@dfinity/identity';
//! import * as auth from '@dfinity/auth-client';
//! await init();
//!
//! const icp = new IcpAgent(agent, identity, auth);
//! // or, for hosts that still publish `window.ic = { agent, identity, auth }`:
//! const icp = IcpAgent.fromGlobal();
//!
//! const id = icp.createIdentityFromKey(savedKeyJson);
//! const actor = await icp.createActor(canisterId, idlFactory, { identity: id });
//! const token = await icp.generateVerificationToken(actor, 'doc-1', ['name'], 3600n);
//!
//! const controller = new AbortController();
//! const user = await icp.authenticateWithII(iiCanisterId, controller.signal);
//! ```

mod host;

use std::rc::Rc;

use futures::future::{AbortHandle, AbortRegistration};
use icp_bridge::{ActorOptions, Bridge, BridgeConfig, KeyError, LoginError};
use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{AbortSignal, AddEventListenerOptions};

pub use host::{HostError, JsActor, JsAgentLibrary, JsAuthProvider, JsIdentityLibrary};

type HostBridge = Bridge<JsAgentLibrary, JsIdentityLibrary, JsAuthProvider>;

/// One-time initialisation called at the start of every exported function.
///
/// Installs the `console_error_panic_hook` when the feature is enabled so
/// that Rust panics are forwarded to the browser console as readable errors
/// rather than appearing as generic "unreachable" WASM traps.
fn setup() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Internet Computer agent operations over the host's `@dfinity` modules.
#[wasm_bindgen]
pub struct IcpAgent {
    bridge: Rc<HostBridge>,
}

#[wasm_bindgen]
impl IcpAgent {
    /// Build from the agent, identity and auth-client modules.
    ///
    /// `config` is an optional plain object:
    ///
    /// ```json
    /// {
    ///   "productionHost": "https://ic0.app",
    ///   "identityProviderDomain": "ic0.app",
    ///   "maxTimeToLiveSecs": 28800,
    ///   "derivationOrigin": "https://app.example.com"
    /// }
    /// ```
    ///
    /// Throws if `config` does not match that shape.
    #[wasm_bindgen(constructor)]
    pub fn new(
        agent: JsValue,
        identity: JsValue,
        auth: JsValue,
        config: Option<js_sys::Object>,
    ) -> Result<IcpAgent, JsValue> {
        setup();
        let config = parse_config(config)?;
        Ok(Self {
            bridge: Rc::new(Bridge::new(
                JsAgentLibrary::new(agent),
                JsIdentityLibrary::new(identity),
                JsAuthProvider::new(auth),
                config,
            )),
        })
    }

    /// Build from `globalThis.ic.{agent, identity, auth}`.
    #[wasm_bindgen(js_name = fromGlobal)]
    pub fn from_global(config: Option<js_sys::Object>) -> Result<IcpAgent, JsValue> {
        setup();
        let ic = host::get(&js_sys::global(), "ic").map_err(HostError::into_js)?;
        if ic.is_undefined() || ic.is_null() {
            return Err(js_sys::Error::new("globalThis.ic is not defined").into());
        }
        let module = |name: &str| host::get(&ic, name).map_err(HostError::into_js);
        Self::new(module("agent")?, module("identity")?, module("auth")?, config)
    }

    /// Build an agent for `host` (production when omitted). Resolves with
    /// the agent; rejects with whatever the agent module threw.
    #[wasm_bindgen(js_name = createAgent)]
    pub fn create_agent(&self, identity: JsValue, host: Option<String>) -> Promise {
        setup();
        let bridge = Rc::clone(&self.bridge);
        future_to_promise(async move {
            bridge
                .create_agent(present(identity), host.as_deref())
                .await
                .map_err(HostError::into_js)
        })
    }

    /// Build an actor for `canister_id`.
    ///
    /// `options.identity` and `options.host` configure the agent; the whole
    /// `options` object is also spread into the actor configuration. Rejects
    /// with a `TypeError` when `options.host` is set but is not a string.
    #[wasm_bindgen(js_name = createActor)]
    pub fn create_actor(&self, canister_id: String, idl_factory: JsValue, options: JsValue) -> Promise {
        setup();
        let bridge = Rc::clone(&self.bridge);
        future_to_promise(async move {
            let (identity, host) = if options.is_object() {
                let identity = host::get(&options, "identity").map_err(HostError::into_js)?;
                let host = match present(host::get(&options, "host").map_err(HostError::into_js)?) {
                    Some(host) => Some(host.as_string().ok_or_else(|| {
                        JsValue::from(js_sys::TypeError::new("options.host must be a string"))
                    })?),
                    None => None,
                };
                (present(identity), host)
            } else {
                (None, None)
            };

            let actor_options = ActorOptions {
                identity,
                host,
                extra: options,
            };
            bridge
                .create_actor(&canister_id, &idl_factory, actor_options)
                .await
                .map_err(HostError::into_js)
        })
    }

    /// Rebuild an identity from the JSON string `Ed25519KeyIdentity.toJSON()`
    /// produced. Throws a `SyntaxError` when the string is not JSON.
    #[wasm_bindgen(js_name = createIdentityFromKey)]
    pub fn create_identity_from_key(&self, private_key: &str) -> Result<JsValue, JsValue> {
        setup();
        self.bridge
            .create_identity_from_key(private_key)
            .map_err(|e| match e {
                KeyError::Malformed(err) => js_sys::SyntaxError::new(&err.to_string()).into(),
                KeyError::Library(err) => err.into_js(),
            })
    }

    /// Log in through the Internet Identity served by `canister_id`.
    ///
    /// Resolves with the new identity, or rejects with the auth client's
    /// error. Aborting `signal` rejects with an `AbortError`.
    #[wasm_bindgen(js_name = authenticateWithII)]
    pub fn authenticate_with_ii(
        &self,
        canister_id: String,
        signal: Option<AbortSignal>,
    ) -> Promise {
        setup();
        let bridge = Rc::clone(&self.bridge);

        let (registration, listener) = match signal.map(AbortListener::attach).transpose() {
            Ok(Some((registration, listener))) => (Some(registration), listener),
            Ok(None) => (None, None),
            Err(err) => return Promise::reject(&err),
        };

        future_to_promise(async move {
            // Detaches from the signal once the login settles.
            let _listener = listener;
            bridge
                .authenticate_with_ii(&canister_id, registration)
                .await
                .map_err(|e| match e {
                    LoginError::Aborted => {
                        let err = js_sys::Error::new("login aborted");
                        err.set_name("AbortError");
                        err.into()
                    }
                    LoginError::Provider(err) => err.into_js(),
                })
        })
    }

    /// **Placeholder: performs no encryption.** Always returns
    /// `{ encryptedData: "encrypted_data_placeholder", nonce: "nonce_placeholder" }`.
    #[wasm_bindgen(js_name = encryptDocument)]
    pub fn encrypt_document(&self, document: JsValue, public_key: JsValue) -> Result<JsValue, JsValue> {
        setup();
        to_js(&self.bridge.encrypt_document(&document, &public_key))
    }

    /// **Placeholder: performs no decryption.** Always returns
    /// `{ decryptedData: "decrypted_data_placeholder" }`.
    #[wasm_bindgen(js_name = decryptDocument)]
    pub fn decrypt_document(
        &self,
        encrypted_data: JsValue,
        nonce: JsValue,
        private_key: JsValue,
    ) -> Result<JsValue, JsValue> {
        setup();
        to_js(
            &self
                .bridge
                .decrypt_document(&encrypted_data, &nonce, &private_key),
        )
    }

    /// Call `actor.generateVerificationToken(documentId, fields, expirySeconds)`.
    ///
    /// `fields` and `expirySeconds` reach the actor untouched, so a Number
    /// and a BigInt expiry are both left for the actor to accept or reject.
    #[wasm_bindgen(js_name = generateVerificationToken)]
    pub fn generate_verification_token(
        &self,
        actor: JsValue,
        document_id: String,
        fields: JsValue,
        expiry_seconds: JsValue,
    ) -> Promise {
        setup();
        let bridge = Rc::clone(&self.bridge);
        future_to_promise(async move {
            bridge
                .generate_verification_token(&JsActor(actor), &document_id, &fields, expiry_seconds)
                .await
                .map_err(HostError::into_js)
        })
    }

    /// Call `actor.verifyToken(token)`.
    #[wasm_bindgen(js_name = verifyToken)]
    pub fn verify_token(&self, actor: JsValue, token: JsValue) -> Promise {
        setup();
        let bridge = Rc::clone(&self.bridge);
        future_to_promise(async move {
            bridge
                .verify_token(&JsActor(actor), token)
                .await
                .map_err(HostError::into_js)
        })
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// An `abort` listener on a caller's `AbortSignal`, removed on drop.
///
/// Added with `addEventListener` so other listeners on the same signal
/// (the host's own, or another pending login's) keep firing.
struct AbortListener {
    signal: AbortSignal,
    callback: Closure<dyn FnMut()>,
}

impl AbortListener {
    /// Link `signal` to a fresh abort registration. An already-aborted
    /// signal aborts the registration immediately and needs no listener.
    fn attach(signal: AbortSignal) -> Result<(AbortRegistration, Option<Self>), JsValue> {
        let (handle, registration) = AbortHandle::new_pair();
        if signal.aborted() {
            handle.abort();
            return Ok((registration, None));
        }

        let callback = Closure::once(move || handle.abort());
        let options = AddEventListenerOptions::new();
        options.set_once(true);
        signal.add_event_listener_with_callback_and_add_event_listener_options(
            "abort",
            callback.as_ref().unchecked_ref(),
            &options,
        )?;
        Ok((registration, Some(Self { signal, callback })))
    }
}

impl Drop for AbortListener {
    fn drop(&mut self) {
        let _ = self
            .signal
            .remove_event_listener_with_callback("abort", self.callback.as_ref().unchecked_ref());
    }
}

/// `null` and `undefined` mean "no value", as they do for agent-js options.
fn present(value: JsValue) -> Option<JsValue> {
    if value.is_null() || value.is_undefined() {
        None
    } else {
        Some(value)
    }
}

fn parse_config(config: Option<js_sys::Object>) -> Result<BridgeConfig, JsValue> {
    let Some(config) = config else {
        return Ok(BridgeConfig::default());
    };
    let json: String = js_sys::JSON::stringify(&config)?.into();
    serde_json::from_str(&json)
        .map_err(|e| JsValue::from(js_sys::TypeError::new(&format!("invalid bridge config: {e}"))))
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value)
        .map_err(|e| JsValue::from(js_sys::Error::new(&e.to_string())))?;
    js_sys::JSON::parse(&json)
}
