//! # Vayara Core
//!
//! Session core of the Vayara product scanner, designed for FFI integration
//! with a Flutter (or any C-capable) presentation layer. The host renders
//! screens; this library decides which screen is visible, what product it
//! shows, and keeps the user's local data in an LMDB environment.
//!
//! ## Components
//!
//! - [`local_store::PersistentStore`] - favorites, scan history, recent
//!   searches, language, subscription, stats and the first-launch marker
//! - [`product_catalog::ProductCatalog`] - scan-code lookup and search
//! - [`navigation::NavigationController`] - screen state machine
//! - [`app_session::AppSession`] - wires the three together
//!
//! ## Quick Start
//!
//! ```no_run
//! use vayara_core::{create_app, dispatch_event, free_response};
//! use std::ffi::CString;
//!
//! let name = CString::new("vayara").unwrap();
//! let app = create_app(name.as_ptr());
//!
//! let event = CString::new(r#"{"type":"splashFinished"}"#).unwrap();
//! let response = dispatch_event(app, event.as_ptr());
//! free_response(response as *mut _);
//! ```
//!
//! ## FFI Functions
//!
//! Every function returns a JSON-encoded [`AppResponse`] C string that the
//! caller releases with [`free_response`]. Successful payloads are JSON text
//! inside the `Ok` variant.
//!
//! - [`create_app`] / [`create_app_with_config`] - open a session
//! - [`dispatch_event`] - feed a navigation intent
//! - [`get_session`] - current screen, product and language
//! - [`is_favorite`], [`toggle_favorite`], [`remove_favorite`], [`get_favorites`]
//! - [`get_history`], [`clear_history`]
//! - [`search_products`], [`submit_search`], [`get_recent_searches`],
//!   [`remove_recent_search`]
//! - [`get_recommendations`]
//! - [`get_subscription`], [`set_subscription`]
//! - [`get_stats`], [`update_stats`]
//! - [`close_app`] - flush and release the session

pub mod app_config;
pub mod app_response;
pub mod app_session;
pub mod local_db_state;
pub mod local_store;
pub mod navigation;
pub mod product_catalog;
pub mod product_model;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::Serialize;

use crate::app_config::AppConfig;
use crate::app_response::AppResponse;
use crate::app_session::AppSession;
use crate::navigation::NavEvent;
use crate::product_model::{Subscription, UserStats};

/// Opens a session backed by `<name>.lmdb` with the default configuration.
///
/// # Parameters
///
/// * `name` - Null-terminated C string with the database base name
///
/// # Returns
///
/// A pointer to the new [`AppSession`], or null on failure. The pointer must
/// be released with [`close_app`].
///
/// # Safety
///
/// `name` must be null or point to a valid null-terminated string.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use vayara_core::{close_app, create_app, free_response};
///
/// let name = CString::new("vayara").unwrap();
/// let app = create_app(name.as_ptr());
/// if !app.is_null() {
///     free_response(close_app(app) as *mut _);
/// }
/// ```
///
/// # Errors
///
/// Returns null if the name is null, not UTF-8, empty, or the LMDB
/// environment cannot be opened.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_app(name: *const c_char) -> *mut AppSession {
    if name.is_null() {
        warn!("Null name pointer passed to create_app");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    open_session(&AppConfig::named(name_str))
}

/// Opens a session from a JSON [`AppConfig`]. Omitted fields take their
/// defaults.
///
/// ```json
/// {"db_name": "vayara", "fallback_language": "fr"}
/// ```
///
/// # Parameters
///
/// * `config_ptr` - Null-terminated C string containing the configuration JSON
///
/// # Returns
///
/// A pointer to the new [`AppSession`], or null when the configuration is
/// malformed, fails validation, or the database cannot be opened.
///
/// # Safety
///
/// `config_ptr` must be null or point to a valid null-terminated string.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_app_with_config(config_ptr: *const c_char) -> *mut AppSession {
    if config_ptr.is_null() {
        warn!("Null config pointer passed to create_app_with_config");
        return std::ptr::null_mut();
    }

    let json = match unsafe { CStr::from_ptr(config_ptr).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in config parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    match AppConfig::from_json(json) {
        Ok(config) => open_session(&config),
        Err(e) => {
            warn!("Rejected app configuration: {e}");
            std::ptr::null_mut()
        }
    }
}

fn open_session(config: &AppConfig) -> *mut AppSession {
    match AppSession::open(config) {
        Ok(session) => {
            info!("Session opened on {}.lmdb", config.db_name);
            Box::into_raw(Box::new(session))
        }
        Err(e) => {
            warn!("Failed to open session {}: {e}", config.db_name);
            std::ptr::null_mut()
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DispatchResult {
    outcome: navigation::NavOutcome,
    session: navigation::SessionView,
}

/// Feeds one navigation intent and returns the outcome with the new session.
///
/// ```json
/// {"type": "scanCodeSubmitted", "code": "1234567890123"}
/// ```
///
/// A scan code with no catalog match comes back as an `Ok` payload whose
/// `outcome` is `{"outcome":"productNotFound","code":...}`; it is not an error.
///
/// # Parameters
///
/// * `app` - Session pointer from [`create_app`]
/// * `event_ptr` - Null-terminated C string containing the event JSON
///
/// # Returns
///
/// `Ok` with `{"outcome": {...}, "session": {"screen", "selectedProduct",
/// "language"}}`. The returned string must be freed with [`free_response`].
///
/// # Safety
///
/// Both pointers must be null or valid. The session must not be used from
/// another thread during the call.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use vayara_core::{create_app, dispatch_event, free_response};
///
/// let name = CString::new("vayara").unwrap();
/// let app = create_app(name.as_ptr());
///
/// let scan = CString::new(r#"{"type":"scanCodeSubmitted","code":"1234567890123"}"#).unwrap();
/// let response = dispatch_event(app, scan.as_ptr());
/// free_response(response as *mut _);
/// ```
///
/// # Errors
///
/// * `BadRequest` - null session, null or non UTF-8 event
/// * `SerializationError` - the event JSON does not name a known event
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn dispatch_event(app: *mut AppSession, event_ptr: *const c_char) -> *const c_char {
    let session = match unsafe { app.as_mut() } {
        Some(s) => s,
        None => return null_session("dispatch_event"),
    };

    let json = match c_ptr_to_string(event_ptr, "event") {
        Ok(json) => json,
        Err(err) => return err,
    };

    let event: NavEvent = match serde_json::from_str(&json) {
        Ok(event) => event,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid event JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    let outcome = session.dispatch(event);
    let result = DispatchResult {
        outcome,
        session: session.view(),
    };
    response_to_c_string(&AppResponse::json(&result))
}

/// Current session view without changing it.
///
/// # Parameters
///
/// * `app` - Session pointer from [`create_app`]
///
/// # Returns
///
/// `Ok` with `{"screen", "selectedProduct", "language"}`, or `BadRequest`
/// for a null session. The returned string must be freed by the caller.
///
/// # Safety
///
/// `app` must be null or a live pointer from [`create_app`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_session(app: *mut AppSession) -> *const c_char {
    match unsafe { app.as_ref() } {
        Some(session) => response_to_c_string(&AppResponse::json(&session.view())),
        None => null_session("get_session"),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteState<'a> {
    product_id: &'a str,
    is_favorite: bool,
}

/// Whether a product is a favorite, for the detail screen's initial state.
///
/// # Parameters
///
/// * `app` - Session pointer from [`create_app`]
/// * `id_ptr` - Null-terminated C string with the product id
///
/// # Returns
///
/// `Ok` with `{"productId", "isFavorite"}`. Unknown ids are simply not
/// favorites. The returned string must be freed by the caller.
///
/// # Safety
///
/// Both pointers must be null or valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn is_favorite(app: *mut AppSession, id_ptr: *const c_char) -> *const c_char {
    let session = match unsafe { app.as_ref() } {
        Some(s) => s,
        None => return null_session("is_favorite"),
    };

    let id = match c_ptr_to_string(id_ptr, "product id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    let is_favorite = session.is_favorite(&id);
    response_to_c_string(&AppResponse::json(&FavoriteState {
        product_id: &id,
        is_favorite,
    }))
}

/// Flips a product's favorite membership.
///
/// # Parameters
///
/// * `app` - Session pointer from [`create_app`]
/// * `id_ptr` - Null-terminated C string with the product id
///
/// # Returns
///
/// `Ok` with `{"productId", "isFavorite"}` where `isFavorite` is the state
/// after the toggle. The returned string must be freed by the caller.
///
/// # Safety
///
/// Both pointers must be null or valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn toggle_favorite(app: *mut AppSession, id_ptr: *const c_char) -> *const c_char {
    let session = match unsafe { app.as_ref() } {
        Some(s) => s,
        None => return null_session("toggle_favorite"),
    };

    let id = match c_ptr_to_string(id_ptr, "product id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    let is_favorite = session.toggle_favorite(&id);
    response_to_c_string(&AppResponse::json(&FavoriteState {
        product_id: &id,
        is_favorite,
    }))
}

/// Drops a product from favorites. Removing a non-favorite is a no-op.
///
/// # Parameters
///
/// * `app` - Session pointer from [`create_app`]
/// * `id_ptr` - Null-terminated C string with the product id
///
/// # Returns
///
/// `Ok` with the remaining favorite products as a JSON array. The returned
/// string must be freed by the caller.
///
/// # Safety
///
/// Both pointers must be null or valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn remove_favorite(app: *mut AppSession, id_ptr: *const c_char) -> *const c_char {
    let session = match unsafe { app.as_ref() } {
        Some(s) => s,
        None => return null_session("remove_favorite"),
    };

    let id = match c_ptr_to_string(id_ptr, "product id") {
        Ok(id) => id,
        Err(err) => return err,
    };

    session.remove_favorite(&id);
    response_to_c_string(&AppResponse::json(&session.favorite_products()))
}

/// Favorite products resolved against the catalog, in the order they were
/// added. Ids no longer in the catalog are skipped.
///
/// # Safety
///
/// `app` must be null or a live pointer from [`create_app`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_favorites(app: *mut AppSession) -> *const c_char {
    match unsafe { app.as_ref() } {
        Some(session) => response_to_c_string(&AppResponse::json(&session.favorite_products())),
        None => null_session("get_favorites"),
    }
}

/// Scan history as products, most recent first, at most 50 entries.
///
/// # Safety
///
/// `app` must be null or a live pointer from [`create_app`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_history(app: *mut AppSession) -> *const c_char {
    match unsafe { app.as_ref() } {
        Some(session) => response_to_c_string(&AppResponse::json(&session.history_products())),
        None => null_session("get_history"),
    }
}

/// Empties the scan history.
///
/// # Returns
///
/// `Ok("History cleared")`, or `BadRequest` for a null session. The
/// returned string must be freed by the caller.
///
/// # Safety
///
/// `app` must be null or a live pointer from [`create_app`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_history(app: *mut AppSession) -> *const c_char {
    match unsafe { app.as_ref() } {
        Some(session) => {
            session.clear_history();
            response_to_c_string(&AppResponse::success("History cleared"))
        }
        None => null_session("clear_history"),
    }
}

/// Live catalog search, meant to run on every keystroke. Recent searches
/// are not touched; use [`submit_search`] for that.
///
/// # Parameters
///
/// * `app` - Session pointer from [`create_app`]
/// * `query_ptr` - Null-terminated C string with the query
///
/// # Returns
///
/// `Ok` with matching products as a JSON array, in catalog order. A blank
/// query matches nothing. The returned string must be freed by the caller.
///
/// # Safety
///
/// Both pointers must be null or valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn search_products(app: *mut AppSession, query_ptr: *const c_char) -> *const c_char {
    let session = match unsafe { app.as_ref() } {
        Some(s) => s,
        None => return null_session("search_products"),
    };

    let query = match c_ptr_to_string(query_ptr, "query") {
        Ok(query) => query,
        Err(err) => return err,
    };

    response_to_c_string(&AppResponse::json(&session.search(&query)))
}

/// Submitted search: same results as [`search_products`], and the trimmed
/// query moves to the front of recent searches.
///
/// # Parameters
///
/// * `app` - Session pointer from [`create_app`]
/// * `query_ptr` - Null-terminated C string with the query
///
/// # Returns
///
/// `Ok` with matching products as a JSON array. The returned string must be
/// freed by the caller.
///
/// # Safety
///
/// Both pointers must be null or valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn submit_search(app: *mut AppSession, query_ptr: *const c_char) -> *const c_char {
    let session = match unsafe { app.as_ref() } {
        Some(s) => s,
        None => return null_session("submit_search"),
    };

    let query = match c_ptr_to_string(query_ptr, "query") {
        Ok(query) => query,
        Err(err) => return err,
    };

    response_to_c_string(&AppResponse::json(&session.submit_search(&query)))
}

/// Recent submitted queries, most recent first, at most 10.
///
/// # Safety
///
/// `app` must be null or a live pointer from [`create_app`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_recent_searches(app: *mut AppSession) -> *const c_char {
    match unsafe { app.as_ref() } {
        Some(session) => response_to_c_string(&AppResponse::json(&session.recent_searches())),
        None => null_session("get_recent_searches"),
    }
}

/// Forgets one recent query. Unknown queries are a no-op.
///
/// # Parameters
///
/// * `app` - Session pointer from [`create_app`]
/// * `query_ptr` - Null-terminated C string with the exact stored query
///
/// # Returns
///
/// `Ok` with the remaining recent searches. The returned string must be
/// freed by the caller.
///
/// # Safety
///
/// Both pointers must be null or valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn remove_recent_search(
    app: *mut AppSession,
    query_ptr: *const c_char,
) -> *const c_char {
    let session = match unsafe { app.as_ref() } {
        Some(s) => s,
        None => return null_session("remove_recent_search"),
    };

    let query = match c_ptr_to_string(query_ptr, "query") {
        Ok(query) => query,
        Err(err) => return err,
    };

    session.remove_recent_search(&query);
    response_to_c_string(&AppResponse::json(&session.recent_searches()))
}

/// Certified products. `category_ptr` may be null for the unscoped list;
/// with a category the list is cut to the first three.
///
/// # Safety
///
/// `app` must be null or a live session pointer; `category_ptr` must be
/// null or a valid null-terminated string.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_recommendations(
    app: *mut AppSession,
    category_ptr: *const c_char,
) -> *const c_char {
    let session = match unsafe { app.as_ref() } {
        Some(s) => s,
        None => return null_session("get_recommendations"),
    };

    let category = if category_ptr.is_null() {
        None
    } else {
        match c_ptr_to_string(category_ptr, "category") {
            Ok(category) => Some(category),
            Err(err) => return err,
        }
    };

    response_to_c_string(&AppResponse::json(
        &session.recommendations(category.as_deref()),
    ))
}

/// Stored subscription, or the free tier when none was saved.
///
/// # Returns
///
/// `Ok` with `{"type", "features", "expiresAt"?, "price"?, "billingCycle"?}`.
/// The returned string must be freed by the caller.
///
/// # Safety
///
/// `app` must be null or a live pointer from [`create_app`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_subscription(app: *mut AppSession) -> *const c_char {
    match unsafe { app.as_ref() } {
        Some(session) => response_to_c_string(&AppResponse::json(&session.subscription())),
        None => null_session("get_subscription"),
    }
}

/// Replaces the stored subscription.
///
/// # Parameters
///
/// * `app` - Session pointer from [`create_app`]
/// * `json_ptr` - Null-terminated C string with the subscription JSON
///
/// # Returns
///
/// `Ok` with the stored subscription, or `SerializationError` when the JSON
/// does not describe one (an unknown tier, for instance).
///
/// # Safety
///
/// Both pointers must be null or valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn set_subscription(app: *mut AppSession, json_ptr: *const c_char) -> *const c_char {
    let session = match unsafe { app.as_ref() } {
        Some(s) => s,
        None => return null_session("set_subscription"),
    };

    let json = match c_ptr_to_string(json_ptr, "subscription") {
        Ok(json) => json,
        Err(err) => return err,
    };

    match serde_json::from_str::<Subscription>(&json) {
        Ok(subscription) => {
            session.set_subscription(&subscription);
            response_to_c_string(&AppResponse::json(&subscription))
        }
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid subscription JSON: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Stored usage counters, all zero when none were saved.
///
/// # Safety
///
/// `app` must be null or a live pointer from [`create_app`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_stats(app: *mut AppSession) -> *const c_char {
    match unsafe { app.as_ref() } {
        Some(session) => response_to_c_string(&AppResponse::json(&session.stats())),
        None => null_session("get_stats"),
    }
}

/// Overwrites the stored stats; the payload is what was actually stored.
///
/// # Parameters
///
/// * `app` - Session pointer from [`create_app`]
/// * `json_ptr` - Null-terminated C string with the stats JSON; missing
///   fields are zero and `favoriteProducts` is replaced by the real count
///
/// # Safety
///
/// Both pointers must be null or valid.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_stats(app: *mut AppSession, json_ptr: *const c_char) -> *const c_char {
    let session = match unsafe { app.as_ref() } {
        Some(s) => s,
        None => return null_session("update_stats"),
    };

    let json = match c_ptr_to_string(json_ptr, "stats") {
        Ok(json) => json,
        Err(err) => return err,
    };

    match serde_json::from_str::<UserStats>(&json) {
        Ok(stats) => response_to_c_string(&AppResponse::json(&session.update_stats(stats))),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid stats JSON: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Flushes and releases the session.
///
/// # Returns
///
/// `Ok("Session closed")`, or the flush error. The session is released in
/// both cases.
///
/// # Safety
///
/// `app` must come from [`create_app`] and must not be used afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_app(app: *mut AppSession) -> *const c_char {
    if app.is_null() {
        return null_session("close_app");
    }

    let session = unsafe { Box::from_raw(app) };
    let response = match session.close() {
        Ok(()) => AppResponse::success("Session closed"),
        Err(e) => e,
    };
    drop(session);
    response_to_c_string(&response)
}

/// Releases a string returned by any function in this library.
///
/// # Safety
///
/// `ptr` must be null or a pointer returned by this library that was not
/// freed before.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr));
    }
}

fn null_session(function: &str) -> *const c_char {
    let error = AppResponse::BadRequest(format!("Null session pointer passed to {function}"));
    response_to_c_string(&error)
}

/// Serializes an [`AppResponse`] into an owned C string for the caller.
///
/// Returns a null pointer if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string argument, or returns the ready-made error response.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
