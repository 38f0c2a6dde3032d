//! Public pages
//!
//! - GET / - carousel of featured articles, latest and hot news
//! - GET /list - all articles, optionally filtered by category
//! - GET /search - article search
//! - GET /post/{slug} - article with comments and related articles
//! - GET /category/{slug}, GET /tag/{slug} - taxonomy listings

use axum::{
    extract::{Path, Query, State},
    http::Uri,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tera::Context as TeraContext;

use super::common::{
    article_views, page_number, ArticleView, CommentView, PageQuery, Pager, View, FEATURED_LIMIT, HOT_LIMIT,
    RELATED_LIMIT,
};
use super::middleware::{AppState, MaybeSession, WebError};
use crate::client::{ArticleQuery, ClientError};
use crate::models::{Article, Category, Page, Tag};
use crate::services::{Carousel, Pagination, SearchState, Session, AUTOPLAY_INTERVAL};
use crate::theme::Notice;

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    #[serde(default)]
    pub slide: Option<String>,
    #[serde(default)]
    pub newsletter: Option<String>,
    #[serde(default)]
    pub newsletter_error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CarouselView {
    slides: Vec<ArticleView>,
    current: usize,
    prev: usize,
    next: usize,
    autoplay: bool,
    interval_ms: u64,
}

impl From<&Carousel<ArticleView>> for CarouselView {
    fn from(carousel: &Carousel<ArticleView>) -> Self {
        Self {
            slides: carousel.items().to_vec(),
            current: carousel.current_index(),
            prev: carousel.prev_index(),
            next: carousel.next_index(),
            autoplay: carousel.autoplay(),
            interval_ms: AUTOPLAY_INTERVAL.as_millis() as u64,
        }
    }
}

/// GET /
pub async fn index(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Query(query): Query<HomeQuery>,
) -> Response {
    let mut view = View::load(&state, session.as_ref(), "/").await;
    view.vars.newsletter_notice = match (&query.newsletter, &query.newsletter_error) {
        (_, Some(error)) => Some(Notice::error(error.clone())),
        (Some(_), None) => Some(Notice::success("Thank you for subscribing!")),
        _ => None,
    };

    let latest_query = ArticleQuery::default();
    let (featured, hot, latest) = futures::join!(
        state.client.featured_articles(FEATURED_LIMIT),
        state.client.hot_articles(HOT_LIMIT),
        state.client.articles(&latest_query),
    );

    let latest = match latest {
        Ok(page) => page.into_items(),
        Err(e) => return view.error(e.into()),
    };
    let featured = featured.unwrap_or_else(|e| {
        tracing::warn!("Featured articles unavailable: {}", e);
        Vec::new()
    });
    let hot = hot.unwrap_or_else(|e| {
        tracing::warn!("Hot articles unavailable: {}", e);
        Vec::new()
    });

    let mut carousel = Carousel::new(article_views(featured), true);
    if let Some(slide) = query.slide.as_deref().and_then(|s| s.parse::<usize>().ok()) {
        carousel.go_to(slide);
    }

    let mut context = TeraContext::new();
    context.insert("carousel", &CarouselView::from(&carousel));
    context.insert("hot", &article_views(hot));
    context.insert("latest", &article_views(latest));
    context.insert("categories", &view.vars.nav_categories);
    view.render("index.html", &context)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// GET /list
pub async fn list(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Query(query): Query<ListQuery>,
) -> Response {
    let view = View::load(&state, session.as_ref(), "/list").await;
    let requested = page_number(query.page.as_deref());
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());

    let api_query = match category {
        Some(slug) => ArticleQuery::category(slug),
        None => ArticleQuery::default(),
    }
    .with_page(requested);

    let page = match fetch_page(&state, &api_query).await {
        Ok(page) => page,
        Err(e) => return view.error(e.into()),
    };

    let pagination = Pagination::new(requested, page.total(), state.config.api.page_size);
    let params: Vec<(&str, &str)> = category.map(|c| vec![("category", c)]).unwrap_or_default();

    let mut context = TeraContext::new();
    context.insert("articles", &article_views(page.into_items()));
    context.insert("pager", &Pager::new(&pagination, "/list", &params));
    context.insert("categories", &view.vars.nav_categories);
    context.insert("active_category", &category);
    view.render("list.html", &context)
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

/// GET /search
pub async fn search(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Query(query): Query<SearchQuery>,
) -> Response {
    let mut view = View::load(&state, session.as_ref(), "/search").await;
    let requested = page_number(query.page.as_deref());

    let search = match SearchState::parse_query(query.q.as_deref()) {
        Err(e) => SearchState::invalid(e),
        Ok(None) => SearchState::Idle,
        Ok(Some(q)) => {
            let api_query = ArticleQuery::search(&q).with_page(requested);
            match fetch_page(&state, &api_query).await {
                Ok(page) => SearchState::from_page(q, page, requested, state.config.api.page_size),
                Err(e) => return view.error(e.into()),
            }
        }
    };

    let (articles, pager) = match &search {
        SearchState::Results { query, articles, pagination } => (
            article_views(articles.clone()),
            Some(Pager::new(pagination, "/search", &[("q", query.as_str())])),
        ),
        _ => (Vec::new(), None),
    };
    view.vars.search_query = search.query().map(str::to_string);

    let mut context = TeraContext::new();
    context.insert("search", &search);
    context.insert("articles", &articles);
    context.insert("pager", &pager);
    view.render("search.html", &context)
}

/// GET /post/{slug}
pub async fn post(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(slug): Path<String>,
    uri: Uri,
) -> Response {
    let view = View::load(&state, session.as_ref(), uri.path()).await;
    render_post(&state, &view, session.as_ref(), &slug, None).await
}

/// Article page, optionally with a message above the comment form
pub async fn render_post(
    state: &AppState,
    view: &View,
    session: Option<&Session>,
    slug: &str,
    comment_notice: Option<Notice>,
) -> Response {
    let article = match state.client.article(slug).await {
        Ok(article) => article,
        Err(e) if e.is_not_found() => {
            return view.error(WebError::not_found("The article you are looking for does not exist."))
        }
        Err(e) => return view.error(e.into()),
    };

    let (comments, related) = futures::join!(
        state.client.comments(slug),
        state.client.related_articles(&article, RELATED_LIMIT),
    );

    let mut comment_notice = comment_notice;
    let comments = comments.unwrap_or_else(|e| {
        tracing::warn!("Comments for {} unavailable: {}", slug, e);
        comment_notice.get_or_insert_with(|| Notice::error("Comments could not be loaded."));
        Vec::new()
    });
    let related = related.unwrap_or_else(|e| {
        tracing::debug!("Related articles for {} unavailable: {}", slug, e);
        Vec::new()
    });

    let viewer = session.map(|s| &s.user);
    let now = chrono::Utc::now();
    let comment_count: usize = comments.iter().map(|c| 1 + c.reply_count()).sum();
    let comments: Vec<CommentView> = comments.iter().map(|c| CommentView::new(c, viewer, now)).collect();

    let mut context = TeraContext::new();
    context.insert("article", &ArticleView::from(article));
    context.insert("comments", &comments);
    context.insert("comment_count", &comment_count);
    context.insert("comment_notice", &comment_notice);
    context.insert("related", &article_views(related));
    context.insert("signed_in", &session.is_some());
    view.render("post.html", &context)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaxonomyKind {
    Category,
    Tag,
}

/// Category or tag heading
#[derive(Debug, Serialize)]
struct Term {
    name: String,
    slug: String,
    description: Option<String>,
}

impl From<Category> for Term {
    fn from(category: Category) -> Self {
        Self {
            name: category.name,
            slug: category.slug,
            description: category.description.filter(|d| !d.trim().is_empty()),
        }
    }
}

impl From<Tag> for Term {
    fn from(tag: Tag) -> Self {
        Self {
            name: tag.name,
            slug: tag.slug,
            description: None,
        }
    }
}

impl TaxonomyKind {
    fn label(self) -> &'static str {
        match self {
            TaxonomyKind::Category => "Category",
            TaxonomyKind::Tag => "Tag",
        }
    }

    /// Listing path with the slug percent-encoded
    fn path(self, slug: &str) -> String {
        let segment = match self {
            TaxonomyKind::Category => "category",
            TaxonomyKind::Tag => "tag",
        };
        format!("/{}/{}", segment, urlencoding::encode(slug))
    }
}

/// GET /category/{slug}
pub async fn category(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    taxonomy(state, session, TaxonomyKind::Category, slug, query.number()).await
}

/// GET /tag/{slug}
pub async fn tag(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    taxonomy(state, session, TaxonomyKind::Tag, slug, query.number()).await
}

async fn taxonomy(
    state: AppState,
    session: Option<Session>,
    kind: TaxonomyKind,
    slug: String,
    requested: u32,
) -> Response {
    let base = kind.path(&slug);
    let view = View::load(&state, session.as_ref(), &base).await;

    // Unknown terms still list articles under a name derived from the slug
    let (term, api_query) = match kind {
        TaxonomyKind::Category => {
            let term = match state.client.category(&slug).await {
                Ok(found) => found.unwrap_or_else(|| Category::from_slug(&slug)),
                Err(e) => return view.error(e.into()),
            };
            (Term::from(term), ArticleQuery::category(&slug))
        }
        TaxonomyKind::Tag => {
            let term = match state.client.tag(&slug).await {
                Ok(found) => found.unwrap_or_else(|| Tag::from_slug(&slug)),
                Err(e) => return view.error(e.into()),
            };
            (Term::from(term), ArticleQuery::tag(&slug))
        }
    };

    let page = match fetch_page(&state, &api_query.with_page(requested)).await {
        Ok(page) => page,
        Err(e) => return view.error(e.into()),
    };
    let pagination = Pagination::new(requested, page.total(), state.config.api.page_size);

    let mut context = TeraContext::new();
    context.insert("kind", kind.label());
    context.insert("term", &term);
    context.insert("articles", &article_views(page.into_items()));
    context.insert("pager", &Pager::new(&pagination, &base, &[]));
    view.render("taxonomy.html", &context)
}

/// Article list page
///
/// The API answers 404 for a page past the end. That becomes an empty page
/// carrying the list's total from the first page, so pagination clamps to
/// the last real page.
async fn fetch_page(state: &AppState, query: &ArticleQuery) -> Result<Page<Article>, ClientError> {
    match state.client.articles(query).await {
        Err(e) if e.is_not_found() && query.page.is_some_and(|p| p > 1) => {
            let first_query = ArticleQuery {
                page: None,
                ..query.clone()
            };
            let first = state.client.articles(&first_query).await?;
            Ok(Page {
                count: Some(first.total()),
                next: None,
                previous: None,
                results: Vec::new(),
            })
        }
        other => other,
    }
}

/// Fallback for unknown paths
pub async fn not_found(State(state): State<AppState>, MaybeSession(session): MaybeSession, uri: Uri) -> Response {
    let view = View::load(&state, session.as_ref(), uri.path()).await;
    view.error(WebError::not_found("The page you are looking for does not exist."))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
