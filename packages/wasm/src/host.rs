//! Library implementations over the host's JavaScript agent libraries.
//!
//! Each type wraps one module object the host already loaded:
//!
//! | Type | Expects | Uses |
//! |------|---------|------|
//! | [`JsAgentLibrary`] | `@dfinity/agent` | `HttpAgent`, `agent.fetchRootKey()`, `Actor.createActor()` |
//! | [`JsIdentityLibrary`] | `@dfinity/identity` | `Ed25519KeyIdentity.fromParsedJson()` |
//! | [`JsAuthProvider`] | `@dfinity/auth-client` | `AuthClient.create()`, `client.login()`, `client.getIdentity()` |
//! | [`JsActor`] | an actor built by the agent library | `generateVerificationToken()`, `verifyToken()` |
//!
//! Members are looked up by name at call time, so anything shaped like
//! those modules works, including test doubles. Whatever the JavaScript side
//! throws or rejects with is kept verbatim in a [`HostError`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use icp_bridge::{
    ActorConfig, AgentLibrary, AuthProvider, IdentityLibrary, LoginOptions, VerificationActor,
};
use js_sys::{Array, BigInt, Function, Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

// ---------------------------------------------------------------------------
// HostError
// ---------------------------------------------------------------------------

/// A value thrown or rejected by JavaScript, untouched.
#[derive(Debug, Clone)]
pub struct HostError(pub JsValue);

impl HostError {
    /// A plain `Error` raised by the bindings themselves.
    pub(crate) fn message(msg: &str) -> Self {
        Self(js_sys::Error::new(msg).into())
    }

    pub fn into_js(self) -> JsValue {
        self.0
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.0.as_string() {
            return f.write_str(&s);
        }
        if let Some(err) = self.0.dyn_ref::<js_sys::Error>() {
            return write!(f, "{}", String::from(err.message()));
        }
        write!(f, "{:?}", self.0)
    }
}

impl std::error::Error for HostError {}

// ---------------------------------------------------------------------------
// @dfinity/agent
// ---------------------------------------------------------------------------

/// `HttpAgent` and `Actor` from the host's agent module.
pub struct JsAgentLibrary {
    module: JsValue,
}

impl JsAgentLibrary {
    pub fn new(module: JsValue) -> Self {
        Self { module }
    }
}

#[async_trait(?Send)]
impl AgentLibrary for JsAgentLibrary {
    type Identity = JsValue;
    type Agent = JsValue;
    type Actor = JsValue;
    type Interface = JsValue;
    type ActorExtra = JsValue;
    type Error = HostError;

    fn create_http_agent(&self, identity: Option<JsValue>, host: &str) -> Result<JsValue, HostError> {
        let http_agent = function(&self.module, "HttpAgent")?;

        let options = Object::new();
        set(&options, "identity", &identity.unwrap_or(JsValue::NULL))?;
        set(&options, "host", &JsValue::from_str(host))?;

        Reflect::construct(&http_agent, &Array::of1(&options)).map_err(HostError)
    }

    async fn fetch_root_key(&self, agent: &JsValue) -> Result<(), HostError> {
        let fetch = function(agent, "fetchRootKey")?;
        let pending = fetch.call0(agent).map_err(HostError)?;
        settle(pending).await.map(|_| ())
    }

    fn create_actor(
        &self,
        interface: &JsValue,
        config: ActorConfig<JsValue, JsValue>,
    ) -> Result<JsValue, HostError> {
        let actor = get(&self.module, "Actor")?;
        let create_actor = function(&actor, "createActor")?;

        // Caller options are spread last, as `{ agent, canisterId, ...options }`.
        let options = Object::new();
        set(&options, "agent", &config.agent)?;
        set(&options, "canisterId", &JsValue::from_str(&config.canister_id))?;
        if let Some(extra) = config.extra.dyn_ref::<Object>() {
            Object::assign(&options, extra);
        }

        create_actor
            .call2(&actor, interface, &options)
            .map_err(HostError)
    }
}

// ---------------------------------------------------------------------------
// @dfinity/identity
// ---------------------------------------------------------------------------

/// `Ed25519KeyIdentity` from the host's identity module.
pub struct JsIdentityLibrary {
    module: JsValue,
}

impl JsIdentityLibrary {
    pub fn new(module: JsValue) -> Self {
        Self { module }
    }
}

impl IdentityLibrary for JsIdentityLibrary {
    type Identity = JsValue;
    type Error = HostError;

    fn identity_from_parsed_json(&self, key: &serde_json::Value) -> Result<JsValue, HostError> {
        let parsed = js_sys::JSON::parse(&key.to_string()).map_err(HostError)?;
        let class = get(&self.module, "Ed25519KeyIdentity")?;
        function(&class, "fromParsedJson")?
            .call1(&class, &parsed)
            .map_err(HostError)
    }
}

// ---------------------------------------------------------------------------
// @dfinity/auth-client
// ---------------------------------------------------------------------------

type LoginSender = Rc<RefCell<Option<oneshot::Sender<Result<(), JsValue>>>>>;

/// `AuthClient` from the host's auth-client module.
pub struct JsAuthProvider {
    module: JsValue,
}

impl JsAuthProvider {
    pub fn new(module: JsValue) -> Self {
        Self { module }
    }
}

#[async_trait(?Send)]
impl AuthProvider for JsAuthProvider {
    type Identity = JsValue;
    type Error = HostError;

    async fn login(&self, options: &LoginOptions) -> Result<JsValue, HostError> {
        let class = get(&self.module, "AuthClient")?;
        let created = function(&class, "create")?.call0(&class).map_err(HostError)?;
        let client = settle(created).await?;

        // Both callbacks share one sender; whichever fires first settles the
        // login and the other becomes a no-op.
        let (tx, rx) = oneshot::channel();
        let tx: LoginSender = Rc::new(RefCell::new(Some(tx)));

        let on_success = {
            let tx = Rc::clone(&tx);
            Closure::once_into_js(move || {
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(Ok(()));
                }
            })
        };
        let on_error = {
            let tx = Rc::clone(&tx);
            Closure::once_into_js(move |error: JsValue| {
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(Err(error));
                }
            })
        };

        let login_options = Object::new();
        set(
            &login_options,
            "identityProvider",
            &JsValue::from_str(&options.identity_provider),
        )?;
        if let Some(ttl) = options.max_time_to_live {
            let nanos = u64::try_from(ttl.as_nanos()).unwrap_or(u64::MAX);
            set(&login_options, "maxTimeToLive", &BigInt::from(nanos).into())?;
        }
        if let Some(origin) = &options.derivation_origin {
            set(&login_options, "derivationOrigin", &JsValue::from_str(origin))?;
        }
        set(&login_options, "onSuccess", &on_success)?;
        set(&login_options, "onError", &on_error)?;

        let started = function(&client, "login")?
            .call1(&client, &login_options)
            .map_err(HostError)?;
        settle(started).await?;

        match rx.await {
            Ok(Ok(())) => {
                let identity = function(&client, "getIdentity")?
                    .call0(&client)
                    .map_err(HostError)?;
                settle(identity).await
            }
            Ok(Err(error)) => Err(HostError(error)),
            Err(oneshot::Canceled) => Err(HostError::message(
                "auth client dropped the login callbacks without calling either",
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// An actor handle exposing the verification canister's methods.
///
/// Fields and expiry are handed to the actor exactly as the caller passed
/// them; the actor's own IDL decides what it accepts.
pub struct JsActor(pub JsValue);

#[async_trait(?Send)]
impl VerificationActor for JsActor {
    type Fields = JsValue;
    type Expiry = JsValue;
    type Token = JsValue;
    type Verification = JsValue;
    type Error = HostError;

    async fn generate_verification_token(
        &self,
        document_id: &str,
        fields: &JsValue,
        expiry_seconds: JsValue,
    ) -> Result<JsValue, HostError> {
        let pending = function(&self.0, "generateVerificationToken")?
            .call3(
                &self.0,
                &JsValue::from_str(document_id),
                fields,
                &expiry_seconds,
            )
            .map_err(HostError)?;
        settle(pending).await
    }

    async fn verify_token(&self, token: JsValue) -> Result<JsValue, HostError> {
        let pending = function(&self.0, "verifyToken")?
            .call1(&self.0, &token)
            .map_err(HostError)?;
        settle(pending).await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

pub(crate) fn get(target: &JsValue, key: &str) -> Result<JsValue, HostError> {
    Reflect::get(target, &JsValue::from_str(key)).map_err(HostError)
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), HostError> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(HostError)
}

fn function(target: &JsValue, name: &str) -> Result<Function, HostError> {
    get(target, name)?
        .dyn_into::<Function>()
        .map_err(|_| HostError::message(&format!("`{name}` is not a function")))
}

/// Await `value` the way JavaScript's `await` would: promises settle,
/// anything else passes straight through.
async fn settle(value: JsValue) -> Result<JsValue, HostError> {
    JsFuture::from(Promise::resolve(&value))
        .await
        .map_err(HostError)
}
