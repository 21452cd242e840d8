use futures_util::future::BoxFuture;

use super::loader::ResourceLoader;
use super::renderer::CardCreator;
use super::types::RenderRequest;
use crate::error::AppError;

/// HTTP 层使用的对象安全服务接口，屏蔽具体的资源加载器类型。
pub trait CardService: Send + Sync {
    fn ensure_init(&self) -> BoxFuture<'_, Result<(), AppError>>;

    /// 资源缓存是否已就绪
    fn is_ready(&self) -> bool;

    fn compose_svg(&self, request: RenderRequest) -> BoxFuture<'_, Result<String, AppError>>;

    fn rasterize(&self, svg: String) -> BoxFuture<'_, Result<Vec<u8>, AppError>>;
}

impl<L: ResourceLoader> CardService for CardCreator<L> {
    fn ensure_init(&self) -> BoxFuture<'_, Result<(), AppError>> {
        Box::pin(CardCreator::ensure_init(self))
    }

    fn is_ready(&self) -> bool {
        CardCreator::is_ready(self)
    }

    fn compose_svg(&self, request: RenderRequest) -> BoxFuture<'_, Result<String, AppError>> {
        Box::pin(CardCreator::compose_svg(self, request))
    }

    fn rasterize(&self, svg: String) -> BoxFuture<'_, Result<Vec<u8>, AppError>> {
        Box::pin(CardCreator::rasterize(self, svg))
    }
}
