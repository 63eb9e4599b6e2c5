pub mod batch;
pub mod cgd;
pub mod lbfgs;
