//! Path router: compiles route paths into matchers and dispatches by method and path

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// HTTP methods the router dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
   Get,
   Post,
}

impl fmt::Display for Method {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         Method::Get => f.write_str("GET"),
         Method::Post => f.write_str("POST"),
      }
   }
}

/// Handler invoked with the path arguments in the order their names appear in the route path
pub type Handler<R> = Box<dyn Fn(&[String]) -> R + Send + Sync>;

enum Matcher {
   Static,
   Dynamic { regex: Regex, params: Vec<String> },
}

/// One method + path + handler registration
pub struct Route<R> {
   method: Method,
   path: String,
   matcher: Matcher,
   handler: Handler<R>,
}

impl<R> Route<R> {
   /// Compile `path` into a route.
   ///
   /// Each `:name` segment captures one or more characters other than `/`;
   /// everything else matches literally and the whole path must match.
   pub fn new<F>(method: Method, path: &str, handler: F) -> Result<Self>
   where
      F: Fn(&[String]) -> R + Send + Sync + 'static,
   {
      let matcher = match compile(path)? {
         Some((regex, params)) => Matcher::Dynamic { regex, params },
         None => Matcher::Static,
      };

      Ok(Self {
         method,
         path: path.to_string(),
         matcher,
         handler: Box::new(handler),
      })
   }

   pub fn method(&self) -> Method {
      self.method
   }

   pub fn path(&self) -> &str {
      &self.path
   }

   pub fn is_static(&self) -> bool {
      matches!(self.matcher, Matcher::Static)
   }

   /// Parameter names in declaration order; empty for static routes
   pub fn params(&self) -> &[String] {
      match &self.matcher {
         Matcher::Static => &[],
         Matcher::Dynamic { params, .. } => params.as_slice(),
      }
   }

   /// Path arguments when `path` matches this route
   pub fn matches(&self, path: &str) -> Option<Vec<String>> {
      match &self.matcher {
         Matcher::Static => (self.path == path).then(Vec::new),
         Matcher::Dynamic { regex, .. } => regex.captures(path).map(|caps| {
            caps
               .iter()
               .skip(1)
               .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
               .collect()
         }),
      }
   }

   pub fn call(&self, args: &[String]) -> R {
      (self.handler)(args)
   }
}

impl<R> fmt::Display for Route<R> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let kind = if self.is_static() { "static" } else { "dynamic" };
      write!(f, "Route({},{},path={})", kind, self.method, self.path)
   }
}

impl<R> fmt::Debug for Route<R> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      fmt::Display::fmt(self, f)
   }
}

fn is_param_start(c: char) -> bool {
   c.is_ascii_alphabetic() || c == '_'
}

fn is_param_char(c: char) -> bool {
   c.is_alphanumeric() || c == '_'
}

/// Anchored pattern and parameter names for `path`, or `None` when it has no parameters
fn compile(path: &str) -> Result<Option<(Regex, Vec<String>)>> {
   let mut pattern = String::from("^");
   let mut params = Vec::new();
   let mut literal = String::new();
   let mut chars = path.chars().peekable();

   while let Some(c) = chars.next() {
      if c != ':' || !chars.peek().is_some_and(|&n| is_param_start(n)) {
         literal.push(c);
         continue;
      }

      let mut name = String::new();
      while let Some(&n) = chars.peek() {
         if !is_param_char(n) {
            break;
         }
         name.push(n);
         chars.next();
      }

      pattern.push_str(&regex::escape(&literal));
      pattern.push_str("([^/]+)");
      literal.clear();
      params.push(name);
   }

   if params.is_empty() {
      return Ok(None);
   }

   pattern.push_str(&regex::escape(&literal));
   pattern.push('$');
   debug!("compiled {} => {}", path, pattern);

   let regex = Regex::new(&pattern).map_err(|e| Error::InvalidRoute {
      path: path.to_string(),
      reason: e.to_string(),
   })?;
   Ok(Some((regex, params)))
}

/// Outcome of [`Router::dispatch`]
#[derive(Debug, PartialEq)]
pub enum Dispatch<R> {
   /// A route matched and its handler returned this value
   Handled(R),
   /// The path falls under a static-file prefix and maps to this file
   StaticFile(PathBuf),
   NotFound,
}

/// Routes requests to handlers by method and path.
///
/// Exact static paths are tried first, then static-file prefixes (GET only),
/// then dynamic routes in registration order.
///
/// # Example
///
/// ```
/// use quillpress::{Dispatch, Method, Router};
///
/// let mut router = Router::new();
/// router
///    .get("/blog/:id", |args| format!("blog {}", args[0]))
///    .unwrap()
///    .get("/blog/new", |_| "new blog".to_string())
///    .unwrap();
///
/// assert_eq!(
///    router.dispatch(Method::Get, "/blog/42"),
///    Dispatch::Handled("blog 42".to_string())
/// );
/// assert_eq!(
///    router.dispatch(Method::Get, "/blog/new"),
///    Dispatch::Handled("new blog".to_string())
/// );
/// assert_eq!(router.dispatch(Method::Post, "/blog/42"), Dispatch::NotFound);
/// ```
pub struct Router<R> {
   static_routes: HashMap<(Method, String), Route<R>>,
   dynamic_routes: Vec<Route<R>>,
   static_files: Vec<(String, PathBuf)>,
}

impl<R> fmt::Debug for Router<R> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Router")
         .field("static_routes", &self.static_routes.values().collect::<Vec<_>>())
         .field("dynamic_routes", &self.dynamic_routes)
         .field("static_files", &self.static_files)
         .finish()
   }
}

impl<R> Default for Router<R> {
   fn default() -> Self {
      Self {
         static_routes: HashMap::new(),
         dynamic_routes: Vec::new(),
         static_files: Vec::new(),
      }
   }
}

impl<R> Router<R> {
   pub fn new() -> Self {
      Self::default()
   }

   /// Register `handler` for `method` and `path`.
   ///
   /// Re-registering a static path replaces the earlier handler.
   pub fn add<F>(&mut self, method: Method, path: &str, handler: F) -> Result<&mut Self>
   where
      F: Fn(&[String]) -> R + Send + Sync + 'static,
   {
      let route = Route::new(method, path, handler)?;
      info!("Add route: {}", route);

      if route.is_static() {
         let key = (method, route.path.clone());
         if self.static_routes.insert(key, route).is_some() {
            warn!("Replaced route: {} {}", method, path);
         }
      } else {
         self.dynamic_routes.push(route);
      }
      Ok(self)
   }

   pub fn get<F>(&mut self, path: &str, handler: F) -> Result<&mut Self>
   where
      F: Fn(&[String]) -> R + Send + Sync + 'static,
   {
      self.add(Method::Get, path, handler)
   }

   pub fn post<F>(&mut self, path: &str, handler: F) -> Result<&mut Self>
   where
      F: Fn(&[String]) -> R + Send + Sync + 'static,
   {
      self.add(Method::Post, path, handler)
   }

   /// Map GET requests under `prefix` to files below `root`
   pub fn serve_static(&mut self, prefix: &str, root: impl Into<PathBuf>) -> &mut Self {
      let mut prefix = prefix.to_string();
      if !prefix.ends_with('/') {
         prefix.push('/');
      }
      let root = root.into();
      info!("Add static files: {} => {}", prefix, root.display());
      self.static_files.push((prefix, root));
      self
   }

   /// All registered routes, static routes first
   pub fn routes(&self) -> impl Iterator<Item = &Route<R>> {
      self.static_routes.values().chain(self.dynamic_routes.iter())
   }

   pub fn dispatch(&self, method: Method, path: &str) -> Dispatch<R> {
      if let Some(route) = self.static_routes.get(&(method, path.to_string())) {
         return Dispatch::Handled(route.call(&[]));
      }

      if method == Method::Get
         && let Some(file) = self.static_file(path)
      {
         return Dispatch::StaticFile(file);
      }

      for route in self.dynamic_routes.iter().filter(|r| r.method == method) {
         if let Some(args) = route.matches(path) {
            debug!("{} matched {}", path, route);
            return Dispatch::Handled(route.call(&args));
         }
      }

      Dispatch::NotFound
   }

   fn static_file(&self, path: &str) -> Option<PathBuf> {
      let (rest, root) = self
         .static_files
         .iter()
         .find_map(|(prefix, root)| path.strip_prefix(prefix.as_str()).map(|rest| (rest, root)))?;

      let rest = Path::new(rest);
      let plain = rest
         .components()
         .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
      if rest.as_os_str().is_empty() || !plain {
         warn!("Rejected static path: {}", path);
         return None;
      }

      Some(root.join(rest))
   }
}
