use crate::domain::model::{NavigationPaths, NormalizedRecord, SegmentFormat, UnmappedPolicy};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
    /// 列出指定副檔名的檔案 (依檔名排序)
    fn list_files(
        &self,
        extension: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn mapping_path(&self) -> &str;
    fn input_dir(&self) -> &str;
    fn output_dir(&self) -> &str;
    fn output_suffix(&self) -> &str;
    fn concurrency(&self) -> usize;
    fn unmapped_policy(&self) -> UnmappedPolicy;
    fn segment_format(&self) -> &SegmentFormat;
    fn navigation(&self) -> &NavigationPaths;
    fn database_url(&self) -> Option<&str>;
}

/// 關聯式資料庫寫入端
///
/// 一份文件只呼叫一次，整批成功或整批失敗。回傳寫入的列數。
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn persist(&self, member_id: Option<&str>, batch: &[NormalizedRecord]) -> Result<u64>;
}
