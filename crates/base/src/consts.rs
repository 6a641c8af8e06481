pub mod k8s {
    pub mod labels {
        pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
        pub const PART_OF: &str = "app.kubernetes.io/part-of";
        pub const COMPONENT: &str = "app.kubernetes.io/component";
    }

    pub mod values {
        /// `app.kubernetes.io/managed-by` value on every object the operator
        /// creates.
        pub const AWX_OPERATOR: &str = "awx-operator";

        /// `app.kubernetes.io/component` value of the PostgreSQL pod.
        pub const DATABASE_COMPONENT: &str = "database";
    }

    /// The `AWX` custom resource served by the operator.
    pub mod awx {
        pub const GROUP: &str = "awx.ansible.com";
        pub const VERSION: &str = "v1beta1";
        pub const KIND: &str = "AWX";
        pub const PLURAL: &str = "awxs";
    }
}

pub const DEFAULT_NAMESPACE: &str = "awx";
pub const DEFAULT_OPERATOR_DEPLOYMENT: &str = "awx-operator-controller-manager";
pub const DEFAULT_OPERATOR_CONTAINER: &str = "awx-manager";
pub const DATABASE_CONTAINER: &str = "postgres";

pub const POSTGRES_CONFIGURATION_SUFFIX: &str = "postgres-configuration";
pub const ADMIN_PASSWORD_SUFFIX: &str = "admin-password";
pub const SERVICE_SUFFIX: &str = "service";
