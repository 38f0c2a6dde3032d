//! Public content: articles, categories, tags and site settings

use super::{ApiClient, ClientResult};
use crate::models::{Article, Category, Page, SiteSettings, Tag};

/// Filters for the article list endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub page: Option<u32>,
}

impl ArticleQuery {
    pub fn search(query: &str) -> Self {
        Self {
            search: Some(query.to_string()),
            ..Self::default()
        }
    }

    pub fn category(slug: &str) -> Self {
        Self {
            category: Some(slug.to_string()),
            ..Self::default()
        }
    }

    pub fn tag(slug: &str) -> Self {
        Self {
            tag: Some(slug.to_string()),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Path of the list endpoint with this query applied
    ///
    /// Empty filters and page 1 are left out, so the unfiltered first page
    /// always maps to the same cache entry.
    pub fn path(&self) -> String {
        let mut params = Vec::new();
        let filters = [
            ("search", &self.search),
            ("category", &self.category),
            ("tag", &self.tag),
        ];
        for (name, value) in filters {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                params.push(format!("{}={}", name, urlencoding::encode(value)));
            }
        }
        if let Some(page) = self.page.filter(|p| *p > 1) {
            params.push(format!("page={}", page));
        }

        if params.is_empty() {
            "articles/".to_string()
        } else {
            format!("articles/?{}", params.join("&"))
        }
    }
}

impl ApiClient {
    /// `GET articles/` with filters
    pub async fn articles(&self, query: &ArticleQuery) -> ClientResult<Page<Article>> {
        self.get_cached(&query.path(), self.ttls.articles).await
    }

    /// `GET articles/{slug}/`
    pub async fn article(&self, slug: &str) -> ClientResult<Article> {
        let path = format!("articles/{}/", urlencoding::encode(slug));
        self.get_cached(&path, self.ttls.articles).await
    }

    /// Featured articles, newest first
    ///
    /// Falls back to the plain list (flagged articles if any, else the newest
    /// ones) when `articles/featured/` is unavailable.
    pub async fn featured_articles(&self, limit: usize) -> ClientResult<Vec<Article>> {
        let mut articles = match self
            .get_cached::<Page<Article>>("articles/featured/", self.ttls.articles)
            .await
        {
            Ok(page) => page.into_items(),
            Err(e) => {
                tracing::warn!("Featured articles unavailable, using article list: {}", e);
                let mut all = self.articles(&ArticleQuery::default()).await?.into_items();
                let flagged: Vec<Article> = all.iter().filter(|a| a.is_featured).cloned().collect();
                if flagged.is_empty() {
                    sort_newest_first(&mut all);
                    all
                } else {
                    flagged
                }
            }
        };
        articles.truncate(limit);
        Ok(articles)
    }

    /// Most viewed articles
    ///
    /// Falls back to the plain list sorted by `view_count` when
    /// `articles/hot/` is unavailable.
    pub async fn hot_articles(&self, limit: usize) -> ClientResult<Vec<Article>> {
        let mut articles = match self
            .get_cached::<Page<Article>>("articles/hot/", self.ttls.articles)
            .await
        {
            Ok(page) => page.into_items(),
            Err(e) => {
                tracing::warn!("Hot articles unavailable, using article list: {}", e);
                let mut all = self.articles(&ArticleQuery::default()).await?.into_items();
                all.sort_by(|a, b| b.view_count.cmp(&a.view_count));
                all
            }
        };
        articles.truncate(limit);
        Ok(articles)
    }

    /// `GET categories/`
    pub async fn categories(&self) -> ClientResult<Vec<Category>> {
        let page: Page<Category> = self.get_cached("categories/", self.ttls.taxonomy).await?;
        Ok(page.into_items())
    }

    /// Category by slug, from the category list
    pub async fn category(&self, slug: &str) -> ClientResult<Option<Category>> {
        Ok(self.categories().await?.into_iter().find(|c| c.slug == slug))
    }

    /// `GET tags/`
    pub async fn tags(&self) -> ClientResult<Vec<Tag>> {
        let page: Page<Tag> = self.get_cached("tags/", self.ttls.taxonomy).await?;
        Ok(page.into_items())
    }

    pub async fn tag(&self, slug: &str) -> ClientResult<Option<Tag>> {
        Ok(self.tags().await?.into_iter().find(|t| t.slug == slug))
    }

    /// `GET settings/`
    pub async fn site_settings(&self) -> ClientResult<SiteSettings> {
        self.get_cached("settings/", self.ttls.taxonomy).await
    }

    /// Articles to suggest under `article`
    ///
    /// Same-category articles come first, then the newest of the rest; the
    /// article itself is never included.
    pub async fn related_articles(&self, article: &Article, limit: usize) -> ClientResult<Vec<Article>> {
        let candidates = self.articles(&ArticleQuery::default()).await?.into_items();
        Ok(pick_related(article, candidates, limit))
    }
}

fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));
}

pub(crate) fn pick_related(article: &Article, candidates: Vec<Article>, limit: usize) -> Vec<Article> {
    let category = article.category_slug();
    let (mut same, mut other): (Vec<Article>, Vec<Article>) = candidates
        .into_iter()
        .filter(|c| c.id != article.id && (c.slug.is_empty() || c.slug != article.slug))
        .partition(|c| category.is_some() && c.category_slug() == category);

    sort_newest_first(&mut same);
    sort_newest_first(&mut other);
    same.extend(other);
    same.truncate(limit);
    same
}
