//! wasm-bindgen-test integration tests for the ICP bridge WASM bindings.
//!
//! Run with:
//!   wasm-pack test packages/wasm --node
//!
//! The `@dfinity` modules are replaced by small JavaScript doubles built
//! with `new Function(...)`, so these tests exercise the real call paths
//! (construction, promise settling, callback wiring) without a replica.

use icp_bridge_wasm::IcpAgent;
use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

// Configure all tests in this file to run in Node.js (no browser required).
wasm_bindgen_test_configure!(run_in_node_experimental);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn js(body: &str) -> JsValue {
    Function::new_no_args(body)
        .call0(&JsValue::NULL)
        .expect("test double must evaluate")
}

fn field(target: &JsValue, key: &str) -> JsValue {
    Reflect::get(target, &JsValue::from_str(key)).unwrap()
}

fn agent_module() -> JsValue {
    js(r#"
        function HttpAgent(options) {
            this.host = options.host;
            this.identity = options.identity;
            this.rootKeyFetched = false;
        }
        HttpAgent.prototype.fetchRootKey = async function () {
            if (this.host.includes('unreachable')) throw new Error('fetch failed');
            this.rootKeyFetched = true;
        };
        const Actor = {
            createActor(idlFactory, config) {
                return { idlFactory, config };
            },
        };
        return { HttpAgent, Actor };
    "#)
}

fn identity_module() -> JsValue {
    js(r#"
        return {
            Ed25519KeyIdentity: {
                fromParsedJson(pair) { return { restoredFrom: pair }; },
            },
        };
    "#)
}

fn auth_module(outcome: &str) -> JsValue {
    js(&format!(
        r#"
        const outcome = '{outcome}';
        return {{
            AuthClient: {{
                async create() {{
                    return {{
                        async login(options) {{
                            this.options = options;
                            if (outcome === 'success') options.onSuccess();
                            if (outcome === 'error') options.onError('UserInterrupt');
                        }},
                        getIdentity() {{ return {{ principal: 'user' }}; }},
                    }};
                }},
            }},
        }};
    "#
    ))
}

fn icp(outcome: &str) -> IcpAgent {
    IcpAgent::new(agent_module(), identity_module(), auth_module(outcome), None).unwrap()
}

// ---------------------------------------------------------------------------
// createAgent / createActor
// ---------------------------------------------------------------------------

#[wasm_bindgen_test]
async fn production_agent_skips_root_key() {
    let agent = JsFuture::from(icp("hang").create_agent(JsValue::NULL, None))
        .await
        .unwrap();
    assert_eq!(field(&agent, "host").as_string().as_deref(), Some("https://ic0.app"));
    assert_eq!(field(&agent, "rootKeyFetched").as_bool(), Some(false));
    assert!(field(&agent, "identity").is_null());
}

#[wasm_bindgen_test]
async fn local_agent_fetches_root_key() {
    let agent = JsFuture::from(
        icp("hang").create_agent(JsValue::NULL, Some("http://127.0.0.1:4943".into())),
    )
    .await
    .unwrap();
    assert_eq!(field(&agent, "rootKeyFetched").as_bool(), Some(true));
}

#[wasm_bindgen_test]
async fn root_key_failure_rejects_with_original_error() {
    let err = JsFuture::from(
        icp("hang").create_agent(JsValue::NULL, Some("http://unreachable".into())),
    )
    .await
    .unwrap_err();
    let err: js_sys::Error = err.dyn_into().unwrap();
    assert_eq!(String::from(err.message()), "fetch failed");
}

#[wasm_bindgen_test]
async fn actor_config_spreads_options() {
    let options = js("return { host: 'http://localhost:4943', callTransform: 'keep-me' };");
    let actor = JsFuture::from(icp("hang").create_actor(
        "ryjl3-tyaaa-aaaaa-aaaba-cai".into(),
        JsValue::from_str("idl"),
        options,
    ))
    .await
    .unwrap();

    let config = field(&actor, "config");
    assert_eq!(
        field(&config, "canisterId").as_string().as_deref(),
        Some("ryjl3-tyaaa-aaaaa-aaaba-cai")
    );
    assert_eq!(field(&config, "callTransform").as_string().as_deref(), Some("keep-me"));
    let agent = field(&config, "agent");
    assert_eq!(field(&agent, "host").as_string().as_deref(), Some("http://localhost:4943"));
    assert_eq!(field(&agent, "rootKeyFetched").as_bool(), Some(true));
}

#[wasm_bindgen_test]
async fn actor_agent_carries_option_identity() {
    let options = js("return { identity: { name: 'alice' } };");
    let actor = JsFuture::from(icp("hang").create_actor(
        "aaaaa-aa".into(),
        JsValue::from_str("idl"),
        options,
    ))
    .await
    .unwrap();

    let agent = field(&field(&actor, "config"), "agent");
    let identity = field(&agent, "identity");
    assert_eq!(field(&identity, "name").as_string().as_deref(), Some("alice"));
    assert_eq!(field(&agent, "host").as_string().as_deref(), Some("https://ic0.app"));
    assert_eq!(field(&agent, "rootKeyFetched").as_bool(), Some(false));
}

#[wasm_bindgen_test]
async fn actor_with_undefined_options_is_anonymous_on_production() {
    let actor = JsFuture::from(icp("hang").create_actor(
        "aaaaa-aa".into(),
        JsValue::from_str("idl"),
        JsValue::UNDEFINED,
    ))
    .await
    .unwrap();

    let config = field(&actor, "config");
    assert_eq!(field(&config, "canisterId").as_string().as_deref(), Some("aaaaa-aa"));
    let agent = field(&config, "agent");
    assert!(field(&agent, "identity").is_null());
    assert_eq!(field(&agent, "host").as_string().as_deref(), Some("https://ic0.app"));
}

#[wasm_bindgen_test]
async fn actor_rejects_non_string_host() {
    let options = js("return { host: new URL('http://localhost:4943') };");
    let err = JsFuture::from(icp("hang").create_actor(
        "aaaaa-aa".into(),
        JsValue::from_str("idl"),
        options,
    ))
    .await
    .unwrap_err();
    assert!(err.is_instance_of::<js_sys::TypeError>());
}

// ---------------------------------------------------------------------------
// createIdentityFromKey
// ---------------------------------------------------------------------------

#[wasm_bindgen_test]
fn identity_from_key_delegates_parsed_json() {
    let id = icp("hang")
        .create_identity_from_key(r#"["302a", "0011"]"#)
        .unwrap();
    let pair: Array = field(&id, "restoredFrom").dyn_into().unwrap();
    assert_eq!(pair.get(0).as_string().as_deref(), Some("302a"));
    assert_eq!(pair.get(1).as_string().as_deref(), Some("0011"));
}

#[wasm_bindgen_test]
fn identity_from_non_json_throws_syntax_error() {
    let err = icp("hang").create_identity_from_key("not json").unwrap_err();
    assert!(err.is_instance_of::<js_sys::SyntaxError>());
}

// ---------------------------------------------------------------------------
// authenticateWithII
// ---------------------------------------------------------------------------

#[wasm_bindgen_test]
async fn login_success_resolves_with_identity() {
    let identity = JsFuture::from(icp("success").authenticate_with_ii("rdmx6-jaaaa-aaaaa-aaadq-cai".into(), None))
        .await
        .unwrap();
    assert_eq!(field(&identity, "principal").as_string().as_deref(), Some("user"));
}

#[wasm_bindgen_test]
async fn login_error_rejects_with_provider_value() {
    let err = JsFuture::from(icp("error").authenticate_with_ii("aaaaa-aa".into(), None))
        .await
        .unwrap_err();
    assert_eq!(err.as_string().as_deref(), Some("UserInterrupt"));
}

fn abort_controller() -> (JsValue, web_sys::AbortSignal) {
    let controller = js("return new AbortController();");
    let signal = field(&controller, "signal").unchecked_into();
    (controller, signal)
}

fn abort(controller: &JsValue) {
    field(controller, "abort")
        .unchecked_into::<Function>()
        .call0(controller)
        .unwrap();
}

#[wasm_bindgen_test]
async fn aborting_pending_login_rejects_with_abort_error() {
    let (controller, signal) = abort_controller();
    let pending = icp("hang").authenticate_with_ii("aaaaa-aa".into(), Some(signal));
    abort(&controller);

    let err = JsFuture::from(pending).await.unwrap_err();
    assert_eq!(field(&err, "name").as_string().as_deref(), Some("AbortError"));
}

#[wasm_bindgen_test]
async fn already_aborted_signal_rejects_with_abort_error() {
    let (controller, signal) = abort_controller();
    abort(&controller);

    let err = JsFuture::from(icp("success").authenticate_with_ii("aaaaa-aa".into(), Some(signal)))
        .await
        .unwrap_err();
    assert_eq!(field(&err, "name").as_string().as_deref(), Some("AbortError"));
}

#[wasm_bindgen_test]
async fn abort_keeps_existing_signal_handlers() {
    let (controller, signal) = abort_controller();
    let host_handler = js("const h = () => { h.calls = (h.calls || 0) + 1; }; return h;");
    Reflect::set(&signal, &"onabort".into(), &host_handler).unwrap();

    let first = icp("hang").authenticate_with_ii("aaaaa-aa".into(), Some(signal.clone()));
    let second = icp("hang").authenticate_with_ii("aaaaa-aa".into(), Some(signal));
    abort(&controller);

    for pending in [first, second] {
        let err = JsFuture::from(pending).await.unwrap_err();
        assert_eq!(field(&err, "name").as_string().as_deref(), Some("AbortError"));
    }
    assert_eq!(field(&host_handler, "calls").as_f64(), Some(1.0));
}

// ---------------------------------------------------------------------------
// Placeholders
// ---------------------------------------------------------------------------

#[wasm_bindgen_test]
fn encrypt_document_returns_placeholder_shape() {
    let out = icp("hang")
        .encrypt_document(JsValue::from_str("doc"), JsValue::from_str("pk"))
        .unwrap();
    assert_eq!(
        field(&out, "encryptedData").as_string().as_deref(),
        Some("encrypted_data_placeholder")
    );
    assert_eq!(field(&out, "nonce").as_string().as_deref(), Some("nonce_placeholder"));
}

#[wasm_bindgen_test]
fn decrypt_document_returns_placeholder_shape() {
    let out = icp("hang")
        .decrypt_document(JsValue::NULL, JsValue::NULL, JsValue::NULL)
        .unwrap();
    assert_eq!(
        field(&out, "decryptedData").as_string().as_deref(),
        Some("decrypted_data_placeholder")
    );
}

// ---------------------------------------------------------------------------
// Verification tokens
// ---------------------------------------------------------------------------

#[wasm_bindgen_test]
async fn verification_calls_reach_actor_methods() {
    let actor = js(r#"
        return {
            async generateVerificationToken(id, fields, expiry) {
                return `${id}|${fields.join(',')}|${expiry}`;
            },
            async verifyToken(token) { return { valid: token.startsWith('doc-') }; },
        };
    "#);
    let fields: Array = ["name", "dob"].iter().map(|s| JsValue::from_str(s)).collect();

    let bridge = icp("hang");
    let token = JsFuture::from(bridge.generate_verification_token(
        actor.clone(),
        "doc-1".into(),
        fields.into(),
        js_sys::BigInt::from(3600u64).into(),
    ))
    .await
    .unwrap();
    assert_eq!(token.as_string().as_deref(), Some("doc-1|name,dob|3600"));

    let result = JsFuture::from(bridge.verify_token(actor, token)).await.unwrap();
    assert_eq!(field(&result, "valid").as_bool(), Some(true));
}

#[wasm_bindgen_test]
async fn verification_arguments_reach_actor_unchanged() {
    let actor = js(r#"
        const actor = {
            async generateVerificationToken(id, fields, expiry) {
                actor.seen = { id, fields, expiry };
                return 'token';
            },
        };
        return actor;
    "#);
    let fields = js("return ['name', 42];");

    JsFuture::from(icp("hang").generate_verification_token(
        actor.clone(),
        "doc-2".into(),
        fields.clone(),
        JsValue::from_f64(3600.0),
    ))
    .await
    .unwrap();

    let seen = field(&actor, "seen");
    assert_eq!(field(&seen, "id").as_string().as_deref(), Some("doc-2"));
    assert_eq!(field(&seen, "expiry").as_f64(), Some(3600.0));
    assert!(Object::is(&field(&seen, "fields"), &fields));
}

#[wasm_bindgen_test]
async fn verify_token_rejection_is_forwarded() {
    let actor = js(r#"
        return { async verifyToken(token) { throw 'revoked:' + token; } };
    "#);
    let err = JsFuture::from(icp("hang").verify_token(actor, "t-1".into()))
        .await
        .unwrap_err();
    assert_eq!(err.as_string().as_deref(), Some("revoked:t-1"));
}

#[wasm_bindgen_test]
fn from_global_without_ic_throws() {
    assert!(IcpAgent::from_global(None).is_err());
}
