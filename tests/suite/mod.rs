mod degraded;
mod healthy;
mod render;
