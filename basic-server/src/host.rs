//! In-memory demo site: posts, media and extensions

use axum::{
	Extension, Form, Json, Router,
	body::Bytes,
	extract::{Path, State},
	middleware::from_fn_with_state,
	response::Html,
	routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::RwLock;

use preservation::app::AppBuilder;
use preservation::middleware::intercept;
use preservation::notice::Notice;
use preservation::prelude::*;
use preservation::routes::HostRoutes;

#[derive(Debug, Clone, Serialize)]
pub struct Post {
	pub id: u64,
	pub title: String,
	pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct PostForm {
	pub title: String,
	#[serde(default)]
	pub body: String,
}

#[derive(Debug, Default)]
struct Posts {
	next_id: u64,
	items: BTreeMap<u64, Post>,
}

#[derive(Debug, Default)]
pub struct PostStore {
	posts: RwLock<Posts>,
	extensions: RwLock<Vec<String>>,
	media: RwLock<Vec<usize>>,
	widgets: RwLock<BTreeMap<String, String>>,
	menus: RwLock<BTreeMap<String, String>>,
}

impl PostStore {
	pub async fn list(&self) -> Vec<Post> {
		self.posts.read().await.items.values().cloned().collect()
	}

	pub async fn create(&self, form: PostForm) -> Post {
		let mut posts = self.posts.write().await;
		posts.next_id += 1;
		let post = Post { id: posts.next_id, title: form.title, body: form.body };
		posts.items.insert(post.id, post.clone());
		post
	}

	pub async fn get(&self, id: u64) -> ClResult<Post> {
		self.posts.read().await.items.get(&id).cloned().ok_or(Error::NotFound)
	}

	pub async fn update(&self, id: u64, form: PostForm) -> ClResult<Post> {
		let mut posts = self.posts.write().await;
		let post = posts.items.get_mut(&id).ok_or(Error::NotFound)?;
		post.title = form.title;
		post.body = form.body;
		Ok(post.clone())
	}

	pub async fn delete(&self, id: u64) -> ClResult<()> {
		self.posts.write().await.items.remove(&id).map(|_| ()).ok_or(Error::NotFound)
	}
}

type Store = Extension<Arc<PostStore>>;

fn require(principal: &Principal, capability: &str) -> ClResult<()> {
	if !principal.can(capability) {
		return Err(Error::PermissionDenied);
	}
	Ok(())
}

pub const POSTS_SCREEN: &str = "host.posts";
pub const EDIT_POST_SCREEN: &str = "host.edit_post";
pub const DONE_SCREEN: &str = "host.done";

/// Register the demo screens with the app builder
pub fn register_templates(builder: &mut AppBuilder) {
	builder
		.template(POSTS_SCREEN, include_str!("../templates/posts.html.hbs"))
		.template(EDIT_POST_SCREEN, include_str!("../templates/edit_post.html.hbs"))
		.template(DONE_SCREEN, include_str!("../templates/done.html.hbs"));
}

#[derive(Serialize)]
struct PostsScreen {
	banner: String,
	posts: Vec<Post>,
	editable: bool,
}

#[derive(Serialize)]
struct Done {
	message: String,
}

fn done(app: &App, message: String) -> ClResult<Html<String>> {
	Ok(Html(app.templates.render(DONE_SCREEN, &Done { message })?))
}

// Admin screens //
//***************//
async fn posts_screen(
	State(app): State<App>,
	Extension(store): Store,
	principal: Principal,
	guard: Guard,
) -> ClResult<Html<String>> {
	let banner = Notice::for_state(guard.lock(), guard.principal()).render_html(&app.templates)?;
	let screen = PostsScreen {
		banner,
		posts: store.list().await,
		// Edit controls follow the principal as stripped for this request
		editable: principal.can("edit_content"),
	};
	Ok(Html(app.templates.render(POSTS_SCREEN, &screen)?))
}

async fn edit_post_screen(
	State(app): State<App>,
	Extension(store): Store,
	Path(id): Path<u64>,
) -> ClResult<Html<String>> {
	let post = store.get(id).await?;
	Ok(Html(app.templates.render(EDIT_POST_SCREEN, &post)?))
}

async fn create_post_screen(
	State(app): State<App>,
	Extension(store): Store,
	principal: Principal,
	Form(form): Form<PostForm>,
) -> ClResult<Html<String>> {
	require(&principal, "edit_content")?;
	let post = store.create(form).await;
	info!(subject = %principal.id_tag, id = post.id, "Post created");
	done(&app, format!("Post {} published.", post.id))
}

async fn update_post_screen(
	State(app): State<App>,
	Extension(store): Store,
	principal: Principal,
	Path(id): Path<u64>,
	Form(form): Form<PostForm>,
) -> ClResult<Html<String>> {
	require(&principal, "edit_content")?;
	store.update(id, form).await?;
	done(&app, format!("Post {} saved.", id))
}

async fn delete_post_screen(
	State(app): State<App>,
	Extension(store): Store,
	principal: Principal,
	Path(id): Path<u64>,
) -> ClResult<Html<String>> {
	require(&principal, "delete_content")?;
	store.delete(id).await?;
	done(&app, format!("Post {} deleted.", id))
}

async fn install_extension(
	State(app): State<App>,
	Extension(store): Store,
	principal: Principal,
	Path(name): Path<String>,
) -> ClResult<Html<String>> {
	require(&principal, "install_extensions")?;
	store.extensions.write().await.push(name.clone());
	info!(subject = %principal.id_tag, extension = %name, "Extension installed");
	done(&app, format!("Extension {} installed.", name))
}

#[derive(Debug, Deserialize)]
pub struct ContentForm {
	#[serde(default)]
	pub content: String,
}

async fn update_widget(
	State(app): State<App>,
	Extension(store): Store,
	principal: Principal,
	Path(area): Path<String>,
	Form(form): Form<ContentForm>,
) -> ClResult<Html<String>> {
	require(&principal, "edit_widgets")?;
	store.widgets.write().await.insert(area.clone(), form.content);
	done(&app, format!("Widget area {} updated.", area))
}

async fn update_menu(
	State(app): State<App>,
	Extension(store): Store,
	principal: Principal,
	Path(name): Path<String>,
	Form(form): Form<ContentForm>,
) -> ClResult<Html<String>> {
	require(&principal, "edit_menus")?;
	store.menus.write().await.insert(name.clone(), form.content);
	done(&app, format!("Menu {} updated.", name))
}

// API //
//*****//
async fn list_posts(Extension(store): Store) -> Json<ApiResponse<Vec<Post>>> {
	Json(ApiResponse::new(store.list().await))
}

async fn create_post(
	Extension(store): Store,
	principal: Principal,
	Json(form): Json<PostForm>,
) -> ClResult<Json<ApiResponse<Post>>> {
	require(&principal, "edit_content")?;
	Ok(Json(ApiResponse::new(store.create(form).await)))
}

async fn update_post(
	Extension(store): Store,
	principal: Principal,
	Path(id): Path<u64>,
	Json(form): Json<PostForm>,
) -> ClResult<Json<ApiResponse<Post>>> {
	require(&principal, "edit_content")?;
	Ok(Json(ApiResponse::new(store.update(id, form).await?)))
}

async fn delete_post(
	Extension(store): Store,
	principal: Principal,
	Path(id): Path<u64>,
) -> ClResult<Json<ApiResponse<u64>>> {
	require(&principal, "delete_content")?;
	store.delete(id).await?;
	Ok(Json(ApiResponse::new(id)))
}

async fn upload_media(
	Extension(store): Store,
	principal: Principal,
	body: Bytes,
) -> ClResult<Json<ApiResponse<usize>>> {
	require(&principal, "upload_media")?;
	let mut media = store.media.write().await;
	media.push(body.len());
	info!(subject = %principal.id_tag, size = body.len(), "Media uploaded");
	Ok(Json(ApiResponse::new(media.len())))
}

/// Demo site routes. Only the mutating method of each route carries its
/// interception site; the edit screen is the one guarded GET.
pub fn routes(app: &App, store: Arc<PostStore>) -> HostRoutes {
	let admin = Router::new()
		.route(
			"/admin/posts",
			post(create_post_screen)
				.route_layer(from_fn_with_state(app.clone(), intercept(Site::ContentSave)))
				.get(posts_screen),
		)
		.route(
			"/admin/posts/{id}",
			post(update_post_screen)
				.route_layer(from_fn_with_state(app.clone(), intercept(Site::ContentSave))),
		)
		.route(
			"/admin/posts/{id}/edit",
			get(edit_post_screen)
				.route_layer(from_fn_with_state(app.clone(), intercept(Site::EditScreenRender))),
		)
		.route(
			"/admin/posts/{id}/delete",
			post(delete_post_screen)
				.route_layer(from_fn_with_state(app.clone(), intercept(Site::ContentDelete))),
		)
		.route(
			"/admin/widgets/{area}",
			post(update_widget)
				.route_layer(from_fn_with_state(app.clone(), intercept(Site::WidgetUpdate))),
		)
		.route(
			"/admin/menus/{name}",
			post(update_menu)
				.route_layer(from_fn_with_state(app.clone(), intercept(Site::MenuUpdate))),
		)
		.route(
			"/admin/extensions/{name}",
			post(install_extension)
				.route_layer(from_fn_with_state(app.clone(), intercept(Site::ExtensionChange))),
		)
		.layer(Extension(store.clone()));

	let api = Router::new()
		.route(
			"/api/posts",
			post(create_post)
				.route_layer(from_fn_with_state(app.clone(), intercept(Site::ContentSave)))
				.get(list_posts),
		)
		.route(
			"/api/posts/{id}",
			put(update_post)
				.route_layer(from_fn_with_state(app.clone(), intercept(Site::ContentSave)))
				.merge(
					delete(delete_post)
						.route_layer(from_fn_with_state(app.clone(), intercept(Site::ContentDelete))),
				),
		)
		.route(
			"/api/media",
			post(upload_media)
				.route_layer(from_fn_with_state(app.clone(), intercept(Site::MediaUpload))),
		)
		.layer(Extension(store));

	HostRoutes { admin, api }
}


// vim: ts=4
