//! The endpoint contract.
//!
//! An endpoint is a user type constructed fresh for every request. It
//! declares which HTTP methods it handles through a [`MethodTable`] of plain
//! function pointers, so method dispatch is a table lookup rather than a name
//! lookup. Optional hooks run before and after the method callback.

use std::any::TypeId;
use std::fmt;

use http::Method;

use crate::context::Context;
use crate::error::HandlerResult;

/// A per-method endpoint callback.
pub type Callback<E> = fn(&mut E, &mut Context) -> HandlerResult;

/// A user-defined request handler bound to one or more route patterns.
///
/// # Example
///
/// ```
/// use bamboo_core::{Context, Endpoint, HandlerResult, MethodTable};
///
/// struct Hello {
///     greeting: &'static str,
/// }
///
/// impl Hello {
///     fn get(&mut self, ctx: &mut Context) -> HandlerResult {
///         let name = ctx.param_str("name").unwrap_or("world").to_string();
///         ctx.send_body(format!("{}, {name}!", self.greeting))?;
///         Ok(())
///     }
/// }
///
/// impl Endpoint for Hello {
///     fn methods() -> MethodTable<Self> {
///         MethodTable::new().get(Self::get)
///     }
/// }
/// ```
pub trait Endpoint: Sized + Send + 'static {
    /// The callbacks this endpoint implements.
    fn methods() -> MethodTable<Self>;

    /// Runs before the method callback.
    ///
    /// Returning an error skips the callback and the post-dispatch hook.
    fn before_dispatch(&mut self, _ctx: &mut Context) -> HandlerResult {
        Ok(())
    }

    /// Runs after a successful method callback.
    fn after_dispatch(&mut self, _ctx: &mut Context) -> HandlerResult {
        Ok(())
    }
}

/// Maps HTTP methods to endpoint callbacks.
///
/// Standard methods have a dedicated slot; any other method (for example
/// `PROPFIND`) can be added with [`MethodTable::method`].
pub struct MethodTable<E> {
    get: Option<Callback<E>>,
    post: Option<Callback<E>>,
    put: Option<Callback<E>>,
    delete: Option<Callback<E>>,
    patch: Option<Callback<E>>,
    head: Option<Callback<E>>,
    options: Option<Callback<E>>,
    trace: Option<Callback<E>>,
    connect: Option<Callback<E>>,
    extensions: Vec<(Method, Callback<E>)>,
}

impl<E> Default for MethodTable<E> {
    fn default() -> Self {
        Self {
            get: None,
            post: None,
            put: None,
            delete: None,
            patch: None,
            head: None,
            options: None,
            trace: None,
            connect: None,
            extensions: Vec::new(),
        }
    }
}

impl<E> Clone for MethodTable<E> {
    fn clone(&self) -> Self {
        Self {
            get: self.get,
            post: self.post,
            put: self.put,
            delete: self.delete,
            patch: self.patch,
            head: self.head,
            options: self.options,
            trace: self.trace,
            connect: self.connect,
            extensions: self.extensions.clone(),
        }
    }
}

impl<E> MethodTable<E> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a GET callback.
    #[must_use]
    pub fn get(mut self, callback: Callback<E>) -> Self {
        self.get = Some(callback);
        self
    }

    /// Registers a POST callback.
    #[must_use]
    pub fn post(mut self, callback: Callback<E>) -> Self {
        self.post = Some(callback);
        self
    }

    /// Registers a PUT callback.
    #[must_use]
    pub fn put(mut self, callback: Callback<E>) -> Self {
        self.put = Some(callback);
        self
    }

    /// Registers a DELETE callback.
    #[must_use]
    pub fn delete(mut self, callback: Callback<E>) -> Self {
        self.delete = Some(callback);
        self
    }

    /// Registers a PATCH callback.
    #[must_use]
    pub fn patch(mut self, callback: Callback<E>) -> Self {
        self.patch = Some(callback);
        self
    }

    /// Registers a HEAD callback.
    #[must_use]
    pub fn head(mut self, callback: Callback<E>) -> Self {
        self.head = Some(callback);
        self
    }

    /// Registers an OPTIONS callback.
    #[must_use]
    pub fn options(mut self, callback: Callback<E>) -> Self {
        self.options = Some(callback);
        self
    }

    /// Registers a TRACE callback.
    #[must_use]
    pub fn trace(mut self, callback: Callback<E>) -> Self {
        self.trace = Some(callback);
        self
    }

    /// Registers a CONNECT callback.
    #[must_use]
    pub fn connect(mut self, callback: Callback<E>) -> Self {
        self.connect = Some(callback);
        self
    }

    /// Registers a callback for any method, replacing an earlier one.
    #[must_use]
    pub fn method(mut self, method: &Method, callback: Callback<E>) -> Self {
        match *method {
            Method::GET => self.get = Some(callback),
            Method::POST => self.post = Some(callback),
            Method::PUT => self.put = Some(callback),
            Method::DELETE => self.delete = Some(callback),
            Method::PATCH => self.patch = Some(callback),
            Method::HEAD => self.head = Some(callback),
            Method::OPTIONS => self.options = Some(callback),
            Method::TRACE => self.trace = Some(callback),
            Method::CONNECT => self.connect = Some(callback),
            _ => match self.extensions.iter_mut().find(|(m, _)| m == method) {
                Some(slot) => slot.1 = callback,
                None => self.extensions.push((method.clone(), callback)),
            },
        }
        self
    }

    /// Returns the callback for `method`.
    pub fn callback(&self, method: &Method) -> Option<Callback<E>> {
        match *method {
            Method::GET => self.get,
            Method::POST => self.post,
            Method::PUT => self.put,
            Method::DELETE => self.delete,
            Method::PATCH => self.patch,
            Method::HEAD => self.head,
            Method::OPTIONS => self.options,
            Method::TRACE => self.trace,
            Method::CONNECT => self.connect,
            _ => self
                .extensions
                .iter()
                .find(|(m, _)| m == method)
                .map(|(_, cb)| *cb),
        }
    }

    /// Returns true if any method has a callback.
    pub fn has_any_method(&self) -> bool {
        !self.allowed_methods().is_empty()
    }

    /// Methods with a callback, standard methods first, without duplicates.
    pub fn allowed_methods(&self) -> Vec<Method> {
        let slots = [
            (Method::GET, self.get.is_some()),
            (Method::POST, self.post.is_some()),
            (Method::PUT, self.put.is_some()),
            (Method::DELETE, self.delete.is_some()),
            (Method::PATCH, self.patch.is_some()),
            (Method::HEAD, self.head.is_some()),
            (Method::OPTIONS, self.options.is_some()),
            (Method::TRACE, self.trace.is_some()),
            (Method::CONNECT, self.connect.is_some()),
        ];
        slots
            .into_iter()
            .filter_map(|(method, present)| present.then_some(method))
            .chain(self.extensions.iter().map(|(m, _)| m.clone()))
            .collect()
    }
}

impl<E> fmt::Debug for MethodTable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("methods", &self.allowed_methods())
            .finish()
    }
}

/// A type-erased endpoint factory as stored in a route table.
pub trait EndpointFactory: Send + Sync + 'static {
    /// `TypeId` of the endpoint type this factory constructs.
    fn endpoint_type(&self) -> TypeId;

    /// Name of the endpoint type, for logs.
    fn endpoint_name(&self) -> &'static str;

    /// Methods the endpoint implements.
    fn allowed_methods(&self) -> Vec<Method>;

    /// Returns true if the endpoint implements `method`.
    fn supports(&self, method: &Method) -> bool;

    /// Constructs the endpoint and runs the hooks and the callback for the
    /// request method.
    ///
    /// Returns `None`, without constructing anything, if the endpoint does not
    /// implement the method.
    fn dispatch(&self, ctx: &mut Context) -> Option<HandlerResult>;
}

struct TypedFactory<E, F> {
    factory: F,
    methods: MethodTable<E>,
}

impl<E, F> EndpointFactory for TypedFactory<E, F>
where
    E: Endpoint,
    F: Fn(&Context) -> E + Send + Sync + 'static,
{
    fn endpoint_type(&self) -> TypeId {
        TypeId::of::<E>()
    }

    fn endpoint_name(&self) -> &'static str {
        std::any::type_name::<E>()
    }

    fn allowed_methods(&self) -> Vec<Method> {
        self.methods.allowed_methods()
    }

    fn supports(&self, method: &Method) -> bool {
        self.methods.callback(method).is_some()
    }

    fn dispatch(&self, ctx: &mut Context) -> Option<HandlerResult> {
        let callback = self.methods.callback(ctx.method())?;
        let mut endpoint = (self.factory)(&*ctx);
        Some(run(&mut endpoint, callback, ctx))
    }
}

fn run<E: Endpoint>(endpoint: &mut E, callback: Callback<E>, ctx: &mut Context) -> HandlerResult {
    endpoint.before_dispatch(ctx)?;
    callback(endpoint, ctx)?;
    endpoint.after_dispatch(ctx)
}

/// Boxes a closure that builds `E` for each request.
///
/// The method table is captured once, here.
pub fn factory<E, F>(factory: F) -> Box<dyn EndpointFactory>
where
    E: Endpoint,
    F: Fn(&Context) -> E + Send + Sync + 'static,
{
    Box::new(TypedFactory {
        factory,
        methods: E::methods(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::request::RequestInfo;
    use crate::response::ErrorResponse;
    use bamboo_router::ParameterBindings;
    use http::StatusCode;

    #[derive(Default)]
    struct Recorder {
        log: Vec<&'static str>,
    }

    impl Recorder {
        fn get(&mut self, ctx: &mut Context) -> HandlerResult {
            self.log.push("get");
            ctx.send_body(self.log.join(","))?;
            Ok(())
        }

        fn post(&mut self, _ctx: &mut Context) -> HandlerResult {
            Err(ErrorResponse::new(StatusCode::CONFLICT).into())
        }
    }

    impl Endpoint for Recorder {
        fn methods() -> MethodTable<Self> {
            MethodTable::new().get(Self::get).post(Self::post)
        }

        fn before_dispatch(&mut self, ctx: &mut Context) -> HandlerResult {
            self.log.push("before");
            ctx.add_header("X-Before", "1");
            Ok(())
        }

        fn after_dispatch(&mut self, ctx: &mut Context) -> HandlerResult {
            self.log.push("after");
            ctx.add_header("X-After", self.log.join(","));
            Ok(())
        }
    }

    fn ctx(method: Method) -> Context {
        Context::new(RequestInfo::new(method, "/"), ParameterBindings::new())
    }

    #[test]
    fn test_method_table_allowed_methods() {
        let table = Recorder::methods();
        assert_eq!(table.allowed_methods(), vec![Method::GET, Method::POST]);
        assert!(table.has_any_method());
        assert!(table.callback(&Method::DELETE).is_none());
    }

    #[test]
    fn test_method_table_extension_methods() {
        let propfind = Method::from_bytes(b"PROPFIND").unwrap();
        let table = MethodTable::<Recorder>::new()
            .method(&propfind, Recorder::get)
            .method(&propfind, Recorder::post)
            .method(&Method::PUT, Recorder::get);

        assert_eq!(table.allowed_methods(), vec![Method::PUT, propfind.clone()]);
        assert!(table.callback(&propfind).is_some());
    }

    #[test]
    fn test_empty_table() {
        let table = MethodTable::<Recorder>::new();
        assert!(!table.has_any_method());
    }

    #[test]
    fn test_hooks_run_in_order() {
        let factory = factory(|_: &Context| Recorder::default());
        let mut ctx = ctx(Method::GET);
        factory.dispatch(&mut ctx).unwrap().unwrap();

        let response = ctx.response();
        assert_eq!(response.header("X-Before"), Some("1"));
        assert_eq!(response.header("X-After"), Some("before,get,after"));
    }

    #[test]
    fn test_unsupported_method_constructs_nothing() {
        let factory = factory(|_: &Context| -> Recorder { panic!("must not construct") });
        let mut ctx = ctx(Method::DELETE);
        assert!(factory.dispatch(&mut ctx).is_none());
        assert!(!factory.supports(&Method::DELETE));
    }

    #[test]
    fn test_failed_callback_skips_after_hook() {
        let factory = factory(|_: &Context| Recorder::default());
        let mut ctx = ctx(Method::POST);
        let result = factory.dispatch(&mut ctx).unwrap();

        assert!(matches!(result, Err(HandlerError::Respond(r)) if r.status() == StatusCode::CONFLICT));
        assert!(ctx.response().header("X-After").is_none());
    }

    #[test]
    fn test_factory_reports_type() {
        let factory = factory(|_: &Context| Recorder::default());
        assert_eq!(factory.endpoint_type(), TypeId::of::<Recorder>());
        assert!(factory.endpoint_name().ends_with("Recorder"));
    }
}
