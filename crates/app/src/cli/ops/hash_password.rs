use clap::Args;

use common::session::sha256_hex;

/// Print the digest to store as `admin_password` in wmk_admin.yaml
#[derive(Args, Debug, Clone)]
pub struct HashPassword {
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum HashPasswordError {
    #[error("the password must not be empty")]
    Empty,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for HashPassword {
    type Error = HashPasswordError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        if self.password.is_empty() {
            return Err(HashPasswordError::Empty);
        }
        Ok(sha256_hex(&self.password))
    }
}
